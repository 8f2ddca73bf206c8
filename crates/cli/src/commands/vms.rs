//! VM listing command

use anyhow::Result;
use forecast_lib::UsageStore;
use tabled::Tabled;

use crate::output::{print_json, print_warning, OutputFormat};

#[derive(Tabled)]
struct VmRow {
    #[tabled(rename = "VM")]
    vm: String,
}

/// List every VM with usage history
pub async fn list_vms(store: &dyn UsageStore, format: OutputFormat) -> Result<()> {
    let vms = store.list_vms().await?;

    match format {
        OutputFormat::Json => print_json(&vms)?,
        OutputFormat::Table => {
            if vms.is_empty() {
                print_warning("No VMs found");
                return Ok(());
            }
            let rows: Vec<VmRow> = vms.iter().map(|vm| VmRow { vm: vm.clone() }).collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} VMs", vms.len());
        }
    }

    Ok(())
}
