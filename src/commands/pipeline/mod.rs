pub mod run_pipeline_command;
