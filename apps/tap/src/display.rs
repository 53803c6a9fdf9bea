//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use console::{Style, Term};
use serde_json::json;
use std::io;
use std::path::Path;
use tap_types::{DescriptorTable, InstallReport, ReleaseDescriptor};

use crate::error::CliError;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    term: Term,
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self {
            json_output,
            term: Term::stdout(),
        }
    }

    fn print_json(value: &serde_json::Value) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        println!("{json}");
        Ok(())
    }

    pub fn render_install_report(&self, report: &InstallReport) -> io::Result<()> {
        if self.json_output {
            return Self::print_json(&serde_json::to_value(report).map_err(io::Error::other)?);
        }

        println!(
            "{} {} {} ({})",
            self.ok_marker(),
            self.bold(&report.name),
            report.version,
            report.platform
        );
        println!("  Installed to: {}", report.artifact.display());
        println!("  Archive:      {}", report.url);
        println!("  SHA-256:      {}", report.checksum);
        println!("  Downloaded:   {}", format_size(report.bytes_downloaded));
        println!("Completed in {}ms", report.duration_ms);
        Ok(())
    }

    pub fn render_descriptor(&self, descriptor: &ReleaseDescriptor) -> io::Result<()> {
        if self.json_output {
            return Self::print_json(&serde_json::to_value(descriptor).map_err(io::Error::other)?);
        }

        println!("Platform: {}", descriptor.platform);
        println!("Version:  {}", descriptor.version);
        println!("URL:      {}", descriptor.url);
        println!("SHA-256:  {}", descriptor.checksum);
        Ok(())
    }

    pub fn render_platforms(&self, table: &DescriptorTable) -> io::Result<()> {
        if self.json_output {
            let platforms: Vec<_> = table
                .platforms()
                .map(|platform| {
                    json!({
                        "platform": platform.to_string(),
                        "archive": table.archive_name(platform, &table.version),
                    })
                })
                .collect();
            return Self::print_json(&json!({
                "name": table.name,
                "version": table.version.to_string(),
                "platforms": platforms,
            }));
        }

        println!("{} {}", self.bold(&table.name), table.version);
        if !table.desc.is_empty() {
            println!("{}", table.desc);
        }
        println!();

        let mut out = Table::new();
        out.load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        out.set_header(vec![
            Cell::new("Platform").add_attribute(Attribute::Bold),
            Cell::new("Archive").add_attribute(Attribute::Bold),
            Cell::new("SHA-256").add_attribute(Attribute::Bold),
        ]);
        for asset in &table.assets {
            let platform = asset.platform();
            out.add_row(vec![
                Cell::new(platform),
                Cell::new(table.archive_name(platform, &table.version)),
                Cell::new(&asset.sha256),
            ]);
        }
        println!("{out}");
        Ok(())
    }

    pub fn render_check(&self, path: &Path) -> io::Result<()> {
        if self.json_output {
            return Self::print_json(&json!({
                "path": path.display().to_string(),
                "ok": true,
            }));
        }
        println!("{} self-check passed: {}", self.ok_marker(), path.display());
        Ok(())
    }

    pub fn render_stamped(&self, table: &DescriptorTable, output: &Path) -> io::Result<()> {
        if self.json_output {
            return Self::print_json(&json!({
                "version": table.version.to_string(),
                "output": output.display().to_string(),
                "assets": table.assets.len(),
            }));
        }
        println!(
            "{} stamped {} {} ({} platforms) into {}",
            self.ok_marker(),
            table.name,
            table.version,
            table.assets.len(),
            output.display()
        );
        Ok(())
    }

    /// Stamped table sent to stdout. JSON mode wraps the TOML text in an envelope.
    pub fn render_stamped_toml(&self, table: &DescriptorTable, rendered: &str) -> io::Result<()> {
        if self.json_output {
            return Self::print_json(&json!({
                "version": table.version.to_string(),
                "assets": table.assets.len(),
                "toml": rendered,
            }));
        }
        print!("{rendered}");
        Ok(())
    }

    /// Report a failure; JSON mode keeps stdout parseable
    pub fn render_error(&self, error: &CliError) {
        if self.json_output {
            let value = json!({
                "error": {
                    "kind": error.failure_kind().as_str(),
                    "code": error.user_code(),
                    "message": error.to_string(),
                    "hint": error.user_hint(),
                }
            });
            if let Ok(rendered) = serde_json::to_string_pretty(&value) {
                println!("{rendered}");
            }
            return;
        }

        let label = if self.supports_color() {
            Style::new().red().bold().apply_to("Error:").to_string()
        } else {
            "Error:".to_string()
        };
        eprintln!("{label} {error}");
        if let Some(code) = error.user_code() {
            eprintln!("  Code: {code}");
        }
        if let Some(hint) = error.user_hint() {
            eprintln!("  Hint: {hint}");
        }
    }

    fn ok_marker(&self) -> String {
        if self.supports_color() {
            Style::new().green().apply_to("[OK]").to_string()
        } else {
            "[OK]".to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn supports_color(&self) -> bool {
        self.term.features().colors_supported()
    }
}

/// Format a byte count for humans
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
