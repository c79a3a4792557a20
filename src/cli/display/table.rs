//! Table rendering for CLI output

use super::{ColorTheme, StatusIcon};
use crate::domain::config::SchemaSelection;
use crate::domain::upgrade::{Classification, UpgradePlan};
use crate::domain::version::Version;
use crate::infrastructure::tools::NodeRole;
use crate::shared::BootstrapError;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Create a new table renderer with default theme
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    fn table() -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table
    }

    /// Observed versions, the classified transition and the steps it will run
    pub fn render_upgrade_plan(&self, plan: &UpgradePlan, role: NodeRole) -> String {
        let current = plan.current();

        let mut sources = Self::table();
        sources.set_header(vec![
            Cell::new("SOURCE").set_alignment(CellAlignment::Left),
            Cell::new("VERSION").set_alignment(CellAlignment::Center),
        ]);
        for (name, version) in [
            ("kubectl client", plan.observed.client),
            ("API server", plan.observed.server),
            ("kubeadm-config", plan.observed.recorded),
        ] {
            sources.add_row(vec![
                Cell::new(name),
                Cell::new(version.tag())
                    .fg(self.theme.source_color(version == current))
                    .set_alignment(CellAlignment::Center),
            ]);
        }

        let mut steps = Self::table();
        steps.set_header(vec![
            Cell::new("STEP").set_alignment(CellAlignment::Center),
            Cell::new("ROUTINE").set_alignment(CellAlignment::Left),
            Cell::new("VERSION").set_alignment(CellAlignment::Center),
        ]);
        for (index, (routine, version)) in plan.steps().iter().enumerate() {
            steps.add_row(vec![
                Cell::new(index + 1).set_alignment(CellAlignment::Center),
                Cell::new(format!("{} {}", StatusIcon::PENDING, routine)),
                Cell::new(version.tag())
                    .fg(self.theme.classification_color(*routine))
                    .set_alignment(CellAlignment::Center),
            ]);
        }

        let status_color = match plan.classification {
            Classification::Patch => "green",
            Classification::Minor => "yellow",
        };

        let mut output = String::new();
        output.push_str(&format!(
            "╭─ Upgrade Plan {} ─╮\n",
            format!("[{} node]", role).bright_black()
        ));
        output.push_str(&sources.to_string());
        output.push('\n');
        output.push_str(&format!(
            "Current: {}  Target: {}  Schema: {}\n",
            current.tag().cyan(),
            plan.target.tag().cyan(),
            plan.variant
        ));
        output.push_str(&format!(
            "{}\n",
            format!(
                "{} {}",
                StatusIcon::for_classification(plan.classification),
                StatusIcon::describe(plan.classification)
            )
            .color(status_color)
        ));
        output.push_str(&steps.to_string());
        output.push('\n');

        output
    }

    /// A transition the governor refused
    pub fn render_rejection(&self, target: &Version, err: &BootstrapError) -> String {
        let mut table = Self::table();
        table.add_row(vec![Cell::new(format!(
            "{} Upgrade to {} rejected",
            StatusIcon::ERROR,
            target.tag()
        ))
        .fg(self.theme.error)]);
        table.add_row(vec![Cell::new(err.to_string()).fg(Color::Red)]);
        table.to_string()
    }

    /// Summary after writing a rendered configuration to disk
    pub fn render_document_summary(&self, selection: &SchemaSelection, path: &str) -> String {
        let mut table = Self::table();
        table.set_header(vec![
            Cell::new("VERSION").set_alignment(CellAlignment::Center),
            Cell::new("SCHEMA").set_alignment(CellAlignment::Left),
            Cell::new("ENCRYPTION FLAG").set_alignment(CellAlignment::Left),
            Cell::new("PATH").set_alignment(CellAlignment::Left),
        ]);
        table.add_row(vec![
            Cell::new(selection.version.tag()).set_alignment(CellAlignment::Center),
            Cell::new(selection.variant).fg(self.theme.info),
            Cell::new(selection.encryption_flag()).fg(self.theme.muted),
            Cell::new(format!("{} {}", StatusIcon::SUCCESS, path)).fg(self.theme.success),
        ]);
        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::select;
    use crate::domain::upgrade::ObservedVersions;

    fn plan() -> UpgradePlan {
        let current = Version::new(1, 16, 3);
        UpgradePlan {
            observed: ObservedVersions {
                client: current,
                server: current,
                recorded: current,
            },
            target: Version::new(1, 17, 2),
            classification: Classification::Minor,
            staging: Some(Version::new(1, 17, 0)),
            variant: crate::domain::config::SchemaVariant::V1Beta2,
        }
    }

    #[test]
    fn test_render_upgrade_plan() {
        let output = TableRenderer::new().render_upgrade_plan(&plan(), NodeRole::Primary);
        assert!(output.contains("Upgrade Plan"));
        assert!(output.contains("v1.16.3"));
        assert!(output.contains("v1.17.0"));
        assert!(output.contains("v1.17.2"));
        assert!(output.contains("kubeadm-config"));
        assert!(output.contains("Minor upgrade (staged)"));
    }

    #[test]
    fn test_render_rejection() {
        let err = BootstrapError::SkewTooLarge {
            current: "1.16.0".to_string(),
            target: "1.18.0".to_string(),
            max_skew: 1,
            gap: 2,
        };
        let output = TableRenderer::new().render_rejection(&Version::new(1, 18, 0), &err);
        assert!(output.contains("rejected"));
        assert!(output.contains("maximum allowed skew is 1"));
    }

    #[test]
    fn test_render_document_summary() {
        let selection = select(&Version::new(1, 12, 5)).unwrap();
        let output = TableRenderer::new()
            .render_document_summary(&selection, "/etc/kubernetes/kubeadm.conf");
        assert!(output.contains("kubeadm.k8s.io/v1alpha3"));
        assert!(output.contains("experimental-encryption-provider-config"));
        assert!(output.contains("/etc/kubernetes/kubeadm.conf"));
    }
}
