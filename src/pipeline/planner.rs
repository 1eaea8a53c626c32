//! Per-group materialisation and job planning

use crate::core::paths::{needs_output, OutputLayout};
use crate::pipeline::extractor::OrthologGroup;
use crate::pipeline::jobs::{JobDescriptor, JobKind, JobParams};
use crate::tools::AlignTool;
use crate::Result;
use std::fs;
use std::path::PathBuf;

/// Files and jobs produced for a retained group
#[derive(Debug, Clone)]
pub struct GroupJobs {
    pub fasta: PathBuf,
    pub alignment: JobDescriptor,
    pub profile: Option<JobDescriptor>,
}

impl GroupJobs {
    pub fn into_jobs(self) -> Vec<JobDescriptor> {
        std::iter::once(self.alignment).chain(self.profile).collect()
    }
}

pub struct JobPlanner<'a> {
    layout: &'a OutputLayout,
    min_taxa: usize,
    align_tool: AlignTool,
}

impl<'a> JobPlanner<'a> {
    pub fn new(layout: &'a OutputLayout, min_taxa: usize, align_tool: AlignTool) -> Self {
        Self {
            layout,
            min_taxa,
            align_tool,
        }
    }

    pub fn min_taxa(&self) -> usize {
        self.min_taxa
    }

    /// Write the group FASTA and plan its alignment and profile jobs.
    ///
    /// Returns `Ok(None)` without touching the disk when the group covers
    /// fewer than `min_taxa` references. The FASTA is rewritten and the
    /// alignment planned on every run; the profile only when missing.
    pub fn plan(&self, group: &OrthologGroup) -> Result<Option<GroupJobs>> {
        if group.taxon_count < self.min_taxa {
            return Ok(None);
        }

        let hmm_dir = self.layout.hmm_dir(&group.id);
        fs::create_dir_all(&hmm_dir)?;

        let fasta = self.layout.group_fasta(&group.id);
        fs::write(&fasta, group.to_fasta())?;

        let alignment_file = self.layout.alignment_file(&group.id);
        let alignment = JobDescriptor::new(
            JobKind::Alignment,
            &group.id,
            vec![fasta.clone()],
            alignment_file.clone(),
        )
        .with_params(JobParams::Aligner(self.align_tool));

        let profile_file = self.layout.profile_file(&group.id);
        let profile = needs_output(&profile_file).then(|| {
            JobDescriptor::new(
                JobKind::ProfileBuild,
                &group.id,
                vec![alignment_file],
                profile_file,
            )
        });

        Ok(Some(GroupJobs {
            fasta,
            alignment,
            profile,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extractor::GroupRecord;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn group(id: &str, members: usize) -> OrthologGroup {
        let records: Vec<GroupRecord> = (0..members)
            .map(|i| GroupRecord {
                header: format!(">{}|SP{}@1@2401|P{}", id, i, i),
                sequence: b"MKV".to_vec(),
            })
            .collect();
        OrthologGroup {
            id: id.to_string(),
            taxon_count: records.len(),
            records,
        }
    }

    #[test]
    fn test_group_below_threshold_is_discarded() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path(), "job");
        let planner = JobPlanner::new(&layout, 3, AlignTool::Mafft);

        assert!(planner.plan(&group("OG_1", 2)).unwrap().is_none());
        assert!(!layout.group_dir("OG_1").exists());
    }

    #[test]
    fn test_retained_group_is_written_and_planned() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path(), "job");
        let planner = JobPlanner::new(&layout, 2, AlignTool::Muscle);

        let planned = planner.plan(&group("OG_1", 2)).unwrap().unwrap();

        assert_eq!(
            fs::read_to_string(&planned.fasta).unwrap(),
            ">OG_1|SP0@1@2401|P0\nMKV\n>OG_1|SP1@1@2401|P1\nMKV\n"
        );
        assert_eq!(planned.alignment.kind, JobKind::Alignment);
        assert_eq!(planned.alignment.params, JobParams::Aligner(AlignTool::Muscle));
        assert_eq!(planned.alignment.output, layout.alignment_file("OG_1"));
        let profile = planned.profile.clone().unwrap();
        assert_eq!(profile.inputs, vec![layout.alignment_file("OG_1")]);
        assert_eq!(profile.output, layout.profile_file("OG_1"));
        assert!(layout.hmm_dir("OG_1").is_dir());
        assert_eq!(planned.into_jobs().len(), 2);
    }

    #[test]
    fn test_existing_profile_skips_only_profile_job() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path(), "job");
        let planner = JobPlanner::new(&layout, 1, AlignTool::Mafft);

        planner.plan(&group("OG_1", 1)).unwrap();
        fs::write(layout.group_fasta("OG_1"), "stale").unwrap();
        fs::write(layout.profile_file("OG_1"), "HMMER3/f").unwrap();

        let planned = planner.plan(&group("OG_1", 1)).unwrap().unwrap();
        assert!(planned.profile.is_none());
        assert_eq!(planned.alignment.kind, JobKind::Alignment);
        assert_ne!(fs::read_to_string(&planned.fasta).unwrap(), "stale");
    }

    #[test]
    fn test_empty_profile_is_rebuilt() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path(), "job");
        let planner = JobPlanner::new(&layout, 1, AlignTool::Mafft);

        planner.plan(&group("OG_2", 1)).unwrap();
        fs::write(layout.profile_file("OG_2"), "").unwrap();

        assert!(planner.plan(&group("OG_2", 1)).unwrap().unwrap().profile.is_some());
    }
}
