use std::path::Path;

use colored::Colorize;
use ignition::{update_bmh_files, InjectionSummary};
use installer::{
    create_config_dir, generate_installation_files, log_upload_plan, plan_uploads,
    prepare_install_config, DUMMY_CLUSTER_ID,
};
use inventory_client::{InventoryClient, InventoryProvider};
use settings::Settings;

use crate::error::AppError;

pub(crate) fn provider(settings: &Settings) -> InventoryProvider {
    InventoryProvider::select(settings.inventory_endpoint(), settings.inventory_timeout())
}

/// The live inventory needs a real cluster id; the stub is happy with a placeholder.
pub(crate) fn resolve_cluster_id<'a>(
    settings: &'a Settings,
    client: &InventoryProvider,
) -> Result<&'a str, AppError> {
    match settings.cluster_id() {
        Ok(id) => Ok(id),
        Err(_) if client.is_stub() => Ok(DUMMY_CLUSTER_ID),
        Err(e) => Err(e.into()),
    }
}

/// Full pipeline: installer dir, install config, installer run, BMH injection, upload plan.
pub fn render(settings: &Settings) -> Result<(), AppError> {
    let work_dir = settings.work_dir()?;
    let config_dir = create_config_dir(work_dir)?;
    prepare_install_config(&config_dir, settings.installer_config.as_deref())?;
    generate_installation_files(work_dir, &config_dir)?;

    let client = provider(settings);
    let cluster_id = resolve_cluster_id(settings, &client)?;
    let summary = update_bmh_files(
        &config_dir.join(&settings.ignition_file_name),
        cluster_id,
        &client,
        settings.correlation,
    )?;
    print_summary(&summary);

    let prefix = settings.cluster_id().unwrap_or(DUMMY_CLUSTER_ID);
    let artifacts = plan_uploads(&config_dir, prefix)?;
    log_upload_plan(&artifacts);
    for artifact in &artifacts {
        println!("{artifact}");
    }

    Ok(())
}

pub fn inject(settings: &Settings, ignition: &Path) -> Result<(), AppError> {
    let client = provider(settings);
    let cluster_id = resolve_cluster_id(settings, &client)?;
    let summary = update_bmh_files(ignition, cluster_id, &client, settings.correlation)?;
    print_summary(&summary);
    Ok(())
}

pub fn hosts(settings: &Settings) -> Result<(), AppError> {
    let client = provider(settings);
    let cluster_id = resolve_cluster_id(settings, &client)?;
    let hosts = client.get_hosts(cluster_id)?;
    println!("{}", serde_json::to_string_pretty(&hosts)?);
    Ok(())
}

fn print_summary(summary: &InjectionSummary) {
    println!(
        "{} {} of {} file entries",
        "Updated BMH manifests:".green().bold(),
        summary.manifests_updated,
        summary.entries_total
    );
}
