mod bootstrap;

use anyhow::{bail, Result};
use econ_core::selection::PipelineInputs;
use econ_core::settings::Settings;
use econ_data::export;
use econ_data::pipeline::{filter_customers, run_pipeline};
use econ_data::reader::DataContext;
use econ_runtime::controller::DashboardController;
use econ_runtime::source::DataSource;
use econ_ui::app::{self, App};
use econ_ui::report::{self, ReportFormat};
use econ_ui::themes::Theme;

/// Write the CSV exports requested on the command line.
fn run_exports(settings: &Settings, context: &DataContext, inputs: &PipelineInputs) -> Result<()> {
    if let Some(path) = &settings.export_customers {
        let view = filter_customers(context.customers(), &inputs.filters);
        export::export_customers(&view, path)?;
    }
    if let Some(path) = &settings.export_segments {
        export::export_segments(context.segments(), path)?;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();
    let interactive = settings.view == "dashboard";

    bootstrap::ensure_directories()?;
    let log_file = settings
        .log_file
        .clone()
        .or_else(|| interactive.then(bootstrap::default_log_file));
    bootstrap::setup_logging(&settings.log_level, log_file.as_deref(), !interactive)?;
    for warning in &settings.warnings {
        tracing::warn!("{}", warning);
    }

    tracing::info!("Unit Economics v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Data dir: {}, Theme: {}",
        settings.view,
        settings.data_dir.display(),
        settings.theme
    );

    let source = DataSource::from_settings(&settings);
    let inputs = settings.pipeline_inputs();
    let theme = Theme::from_name(&settings.theme);

    match settings.view.as_str() {
        "report" => {
            let context = source.load()?;
            run_exports(&settings, &context, &inputs)?;

            let output = run_pipeline(&context, &inputs);
            let text = report::render(
                ReportFormat::from_name(&settings.format),
                &source.data_dir.display().to_string(),
                &inputs,
                &output,
                settings.rows,
            )?;
            println!("{text}");
        }

        "dashboard" => {
            let context = match source.load() {
                Ok(context) => context,
                Err(e) => {
                    tracing::error!("Failed to load data: {}", e);
                    let message = e.to_string();
                    tokio::task::spawn_blocking(move || app::run_error(&theme, &message))
                        .await??;
                    return Err(e.into());
                }
            };
            run_exports(&settings, &context, &inputs)?;

            let export_dir = source.data_dir.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let controller = DashboardController::new(&context, inputs);
                App::new(theme, controller, export_dir).run()
            });

            // The loop exits on 'q' / Ctrl+C inside the TUI. The signal
            // handler covers Ctrl+C delivered while raw mode is not yet active.
            tokio::select! {
                result = handle => {
                    result??;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received; restoring terminal");
                    app::reset_terminal()?;
                    // The blocking event loop cannot be cancelled.
                    std::process::exit(130);
                }
            }
        }

        unknown => bail!("Unknown view mode: {unknown}"),
    }

    tracing::info!("Unit Economics exiting");
    Ok(())
}
