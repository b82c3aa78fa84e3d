//! Save the finished assembly and its report
//!

use std::fs::{self, File};
use std::io::BufWriter;

use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use serde::Serialize;
use simple_error::{SimpleResult, bail, try_with};

use crate::os_utils::create_dir_all;
use crate::report::AssemblyReport;

/// Destination for assembly results
///
/// Object references returned by the publisher are in `workspace/name` form.
///
pub trait AssemblyPublisher {
    fn save_assembly(
        &mut self,
        fasta: &Utf8Path,
        workspace_name: &str,
        assembly_name: &str,
    ) -> SimpleResult<String>;

    fn save_report(&mut self, report: &AssemblyReport, report_name: &str) -> SimpleResult<String>;

    /// Remove a previously saved assembly
    fn remove_assembly(&mut self, assembly_ref: &str) -> SimpleResult<()>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PublishedRun {
    pub assembly_ref: String,
    pub report_name: Option<String>,
    pub report_ref: Option<String>,
}

/// Generate a report object name unique to this run
pub fn unique_report_name(prefix: &str) -> String {
    format!(
        "{}_{}_{}",
        prefix,
        chrono::Local::now().format("%Y%m%d%H%M%S%3f"),
        std::process::id()
    )
}

/// Publish the assembly followed by the optional report
///
/// If the report can't be saved the assembly is removed again, so a failed run leaves nothing behind.
///
pub fn publish_run(
    publisher: &mut dyn AssemblyPublisher,
    fasta: &Utf8Path,
    workspace_name: &str,
    assembly_name: &str,
    report: Option<(&AssemblyReport, &str)>,
) -> SimpleResult<PublishedRun> {
    let assembly_ref = publisher.save_assembly(fasta, workspace_name, assembly_name)?;
    info!("Assembly saved to: {assembly_ref}");

    let mut published = PublishedRun {
        assembly_ref,
        ..Default::default()
    };

    if let Some((report, report_name)) = report {
        match publisher.save_report(report, report_name) {
            Ok(report_ref) => {
                info!("Report saved to: {report_ref}");
                published.report_name = Some(report_name.to_string());
                published.report_ref = Some(report_ref);
            }
            Err(e) => {
                if let Err(remove_error) = publisher.remove_assembly(&published.assembly_ref) {
                    warn!(
                        "Unable to remove assembly '{}' after report failure: {}",
                        published.assembly_ref, remove_error
                    );
                }
                return Err(e);
            }
        }
    }
    Ok(published)
}

/// Publisher writing objects into a local directory tree
///
/// Assemblies are written to `<objects_dir>/<workspace>/<name>.fa` and reports to
/// `<objects_dir>/<workspace>/<name>.json`.
///
pub struct LocalPublisher {
    objects_dir: Utf8PathBuf,
}

impl LocalPublisher {
    pub fn new(objects_dir: &Utf8Path) -> Self {
        Self {
            objects_dir: objects_dir.to_owned(),
        }
    }

    fn workspace_dir(&self, workspace_name: &str) -> SimpleResult<Utf8PathBuf> {
        let dir = self.objects_dir.join(workspace_name);
        create_dir_all(&dir, "workspace objects")?;
        Ok(dir)
    }
}

fn split_object_ref(object_ref: &str) -> SimpleResult<(&str, &str)> {
    match object_ref.split_once('/') {
        Some(x) => Ok(x),
        None => bail!("Invalid object reference '{object_ref}'"),
    }
}

impl AssemblyPublisher for LocalPublisher {
    fn save_assembly(
        &mut self,
        fasta: &Utf8Path,
        workspace_name: &str,
        assembly_name: &str,
    ) -> SimpleResult<String> {
        let dest = self
            .workspace_dir(workspace_name)?
            .join(format!("{assembly_name}.fa"));
        info!("Saving assembly from '{fasta}' to '{dest}'");
        try_with!(fs::copy(fasta, &dest), "Unable to save assembly file '{fasta}' to '{dest}'");
        Ok(format!("{workspace_name}/{assembly_name}"))
    }

    fn save_report(&mut self, report: &AssemblyReport, report_name: &str) -> SimpleResult<String> {
        let dest = self
            .workspace_dir(&report.workspace_name)?
            .join(format!("{report_name}.json"));
        info!("Saving report to '{dest}'");
        let f = try_with!(File::create(&dest), "Unable to create report file '{dest}'");
        try_with!(
            serde_json::to_writer_pretty(BufWriter::new(f), report),
            "Unable to write report file '{dest}'"
        );
        Ok(format!("{}/{}", report.workspace_name, report_name))
    }

    fn remove_assembly(&mut self, assembly_ref: &str) -> SimpleResult<()> {
        let (workspace_name, assembly_name) = split_object_ref(assembly_ref)?;
        let path = self
            .objects_dir
            .join(workspace_name)
            .join(format!("{assembly_name}.fa"));
        try_with!(fs::remove_file(&path), "Unable to remove assembly file '{path}'");
        Ok(())
    }
}
