pub mod suite_pipeline;
