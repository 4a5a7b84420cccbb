use crate::application::use_cases::suite_pipeline::{PipelineOutcome, TestSuitePipeline};
use crate::domain::error::Result;
use crate::infrastructure::config::ConfigService;
use crate::infrastructure::llm_clients::RouterClient;
use crate::infrastructure::oracle::{LlmOracle, RetryPolicy};
use crate::interfaces::cli::{format_rejection, read_document, requirements_path, write_documents};
use crate::interfaces::markdown::MarkdownFormatter;
use crate::interfaces::OutputFormatter;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_REJECTED: u8 = 2;

pub fn run() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(execute(std::env::args().skip(1).collect())) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_REJECTED),
        Err(err) => {
            error!(error = %err, "Run failed");
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` means the document was rejected.
async fn execute(args: Vec<String>) -> Result<bool> {
    let path = requirements_path(args)?;
    let config = ConfigService::new().load()?;
    let document = read_document(&path)?;

    let oracle = Arc::new(LlmOracle::new(
        Arc::new(RouterClient::default()),
        config.llm.clone(),
    ));
    let pipeline = TestSuitePipeline::new(
        oracle,
        RetryPolicy::from(&config.oracle),
        &config.pipeline,
    );

    match pipeline.generate_suite(&document).await? {
        PipelineOutcome::Rejected(report) => {
            print!("{}", format_rejection(&report));
            Ok(false)
        }
        PipelineOutcome::Completed(generated) => {
            let documents = MarkdownFormatter.render(&generated.suite);
            let written = write_documents(&config.output.directory, &documents)?;
            for path in &written {
                println!("{}", path.display());
            }
            info!(
                run_id = %generated.diagnostics.run_id,
                files = written.len(),
                total_cases = generated.suite.total_cases(),
                "Output written"
            );
            Ok(true)
        }
    }
}
