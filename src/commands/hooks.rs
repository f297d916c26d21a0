use anyhow::Result;
use bootrules::Phase;
use colored::Colorize;

use crate::Context;
use crate::commands::lifecycle;
use crate::ui;

/// Print rules per phase in the order they run.
pub fn list(ctx: &Context, phase: Option<Phase>) -> Result<()> {
    let provisioner = lifecycle::provisioner(ctx)?;
    let rules = provisioner.rules();
    let phases: Vec<Phase> = phase.map_or_else(|| Phase::ALL.to_vec(), |p| vec![p]);

    for phase in phases {
        ui::section(&format!(":{phase}"));
        let ordered = rules.rules_for(phase);
        if ordered.is_empty() {
            ui::dim("(none)");
            continue;
        }
        for rule in ordered {
            let owner = rule
                .owner()
                .map_or_else(|| "user".to_string(), |o| o.as_str().to_string());
            println!(
                "  {:>3}  {}  {}",
                rule.priority().to_string().bold(),
                rule.name(),
                format!("[{owner}]").dimmed()
            );
        }
    }
    Ok(())
}
