use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client as S3Client;
use countries_etl::utils::logger;
use countries_etl::utils::validation::Validate;
use countries_etl::{CleaningResponse, CleaningStage, LambdaConfig, S3Storage, TriggerEvent};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

async fn function_handler(
    stage: &CleaningStage<S3Storage>,
    config: &LambdaConfig,
    event: LambdaEvent<serde_json::Value>,
) -> Result<CleaningResponse, Error> {
    tracing::info!(request_id = %event.context.request_id, "Starting cleaning Lambda function");

    let trigger = match TriggerEvent::from_json(event.payload)
        .and_then(|event| event.into_trigger(config.source_bucket.as_deref()))
    {
        Ok(trigger) => trigger,
        Err(e) => {
            tracing::error!("❌ Rejected trigger: {}", e);
            return Ok(CleaningResponse::failure(&e));
        }
    };

    let result = stage.run_trigger(&trigger, &config.destination_bucket).await;
    let response = CleaningResponse::from_result(&trigger, &config.destination_bucket, &result);

    tracing::info!(
        status_code = response.status_code(),
        "Cleaning Lambda function finished"
    );
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 設定錯誤在冷啟動時就失敗，不等到第一個事件
    let config = LambdaConfig::from_env()?;
    config.validate()?;

    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .region(Region::new(config.s3_region.clone()))
        .build();
    let stage = CleaningStage::new(S3Storage::new(S3Client::from_conf(s3_config)));

    let stage = &stage;
    let config = &config;
    run(service_fn(move |event: LambdaEvent<serde_json::Value>| async move {
        function_handler(stage, config, event).await
    }))
    .await
}
