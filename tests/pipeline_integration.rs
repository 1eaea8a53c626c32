mod common;

use common::*;
use orthoprep::core::config::{default_config, PipelineConfig};
use orthoprep::pipeline::JobKind;
use orthoprep::tools::Tool;
use orthoprep::{Orchestrator, OrthoprepError, RunOptions, RunSummary};
use pretty_assertions::assert_eq;
use std::fs;

fn quiet_config() -> PipelineConfig {
    let mut config = default_config();
    config.progress.show_bars = false;
    config
}

fn run_with(options: RunOptions, runner: &MockRunner) -> RunSummary {
    Orchestrator::new(options, quiet_config())
        .with_runner(runner.clone())
        .with_availability(all_tools)
        .run()
        .unwrap()
}

#[test]
fn test_full_run_writes_core_groups() {
    let env = TestEnvironment::new().unwrap();
    let runner = MockRunner::new();

    let summary = run_with(env.options(), &runner);

    assert_eq!(summary.species_registered, 2);
    assert_eq!(summary.species_dropped, vec!["Danio rerio".to_string()]);
    assert_eq!(summary.min_taxa, 2);
    assert_eq!(summary.groups_extracted, 4);
    assert_eq!(summary.groups_retained, 2);

    let expected = format!(
        ">OG_1|{}|HS_1\nMKVLAAGTRW\n>OG_1|{}|MM1\nMKVLGAGTRW\n",
        human_id(),
        mouse_id()
    );
    assert_eq!(read(&env.group_fasta("OG_1")), expected);

    assert!(!env.job_dir().join("OG_2").exists());
    assert!(!env.job_dir().join("OG_3").exists());
    assert!(env.profile_file("OG_1").exists());
    assert!(env.profile_file("OG_4").exists());

    assert_eq!(
        runner.calls(),
        vec![
            (JobKind::IndexBuild, human_id()),
            (JobKind::IndexBuild, mouse_id()),
            (JobKind::Alignment, "OG_1".to_string()),
            (JobKind::Alignment, "OG_4".to_string()),
            (JobKind::ProfileBuild, "OG_1".to_string()),
            (JobKind::ProfileBuild, "OG_4".to_string()),
        ]
    );
    assert!(!summary.has_failures());
}

#[test]
fn test_species_working_copies() {
    let env = TestEnvironment::new().unwrap();
    run_with(env.options(), &MockRunner::new());

    let search_dir = env.output_dir.join("searchTaxa_dir").join(human_id());
    let search_fasta = search_dir.join(format!("{}.fa", human_id()));
    assert_eq!(
        read(&search_fasta),
        ">HS_1 first human protein\nMKVLAAGTRW\n>HS2\nMPEPT\n>HS3\nMQQQ\n"
    );
    assert!(search_dir.join(format!("{}.fa.checked", human_id())).exists());

    let core_fasta = env
        .output_dir
        .join("coreTaxa_dir")
        .join(human_id())
        .join(format!("{}.fa", human_id()));
    assert_eq!(read(&core_fasta), read(&search_fasta));
    assert!(env.output_dir.join("annotation_dir").is_dir());
}

#[test]
fn test_single_species_group_headers() {
    let document = r#"<orthoXML>
  <species name="Homo sapiens">
    <database name="db"><genes>
      <gene id="1" protId="HS|1"/>
      <gene id="2" protId="HS2"/>
    </genes></database>
  </species>
  <groups>
    <orthologGroup id="7">
      <geneRef id="1"/>
      <geneRef id="2"/>
    </orthologGroup>
  </groups>
</orthoXML>"#;
    let env = TestEnvironment::with_document(document).unwrap();
    let mut options = env.options();
    options.min_taxa = 1;

    let summary = run_with(options, &MockRunner::new());

    assert_eq!(summary.groups_retained, 1);
    assert_eq!(
        read(&env.group_fasta("OG_7")),
        format!(
            ">OG_7|{id}|HS_1\nMKVLAAGTRW\n>OG_7|{id}|HS2\nMPEPT\n",
            id = human_id()
        )
    );
}

#[test]
fn test_duplicate_reference_counts_twice() {
    let env = TestEnvironment::new().unwrap();
    let mut options = env.options();
    options.min_taxa = 2;

    run_with(options, &MockRunner::new());

    let expected = format!(
        ">OG_4|{id}|HS3\nMQQQ\n>OG_4|{id}|HS3\nMQQQ\n",
        id = human_id()
    );
    assert_eq!(read(&env.group_fasta("OG_4")), expected);
}

#[test]
fn test_low_threshold_keeps_single_species_groups() {
    let env = TestEnvironment::new().unwrap();
    let mut options = env.options();
    options.min_taxa = 1;

    let summary = run_with(options, &MockRunner::new());

    assert_eq!(summary.groups_retained, 4);
    assert!(env.group_fasta("OG_2").exists());
    assert!(env.group_fasta("OG_3").exists());
}

#[test]
fn test_rerun_only_repeats_alignments() {
    let env = TestEnvironment::new().unwrap();
    run_with(env.options(), &MockRunner::new());

    fs::write(env.group_fasta("OG_1"), "stale\n").unwrap();
    let second = MockRunner::new();
    let summary = run_with(env.options(), &second);

    assert_eq!(second.count(JobKind::IndexBuild), 0);
    assert_eq!(second.count(JobKind::ProfileBuild), 0);
    assert_eq!(second.count(JobKind::Alignment), 2);
    assert_eq!(summary.index.submitted, 0);
    assert!(read(&env.group_fasta("OG_1")).starts_with(">OG_1|"));
}

#[test]
fn test_empty_profile_is_rebuilt() {
    let env = TestEnvironment::new().unwrap();
    run_with(env.options(), &MockRunner::new());

    fs::write(env.profile_file("OG_4"), "").unwrap();
    let second = MockRunner::new();
    run_with(env.options(), &second);

    assert_eq!(
        second
            .calls()
            .into_iter()
            .filter(|(kind, _)| *kind == JobKind::ProfileBuild)
            .collect::<Vec<_>>(),
        vec![(JobKind::ProfileBuild, "OG_4".to_string())]
    );
}

#[test]
fn test_max_groups_stops_extraction() {
    let env = TestEnvironment::new().unwrap();
    let mut options = env.options();
    options.min_taxa = 1;
    options.max_groups = Some(2);

    let summary = run_with(options, &MockRunner::new());

    assert_eq!(summary.groups_extracted, 2);
    assert!(env.group_fasta("OG_2").exists());
    assert!(!env.job_dir().join("OG_3").exists());
    assert!(!env.job_dir().join("OG_4").exists());
}

#[test]
fn test_annotation_runs_when_requested() {
    let env = TestEnvironment::new().unwrap();
    let mut options = env.options();
    options.annotate = true;
    let runner = MockRunner::new();

    let summary = run_with(options, &runner);

    let report = summary.annotation.unwrap();
    assert_eq!(report.submitted, 2);
    assert_eq!(report.succeeded, 2);
    assert!(env
        .output_dir
        .join("annotation_dir")
        .join(format!("{}.json", mouse_id()))
        .exists());
}

#[test]
fn test_annotation_skipped_by_default() {
    let env = TestEnvironment::new().unwrap();
    let runner = MockRunner::new();

    let summary = run_with(env.options(), &runner);

    assert!(summary.annotation.is_none());
    assert_eq!(runner.count(JobKind::Annotation), 0);
}

#[test]
fn test_missing_tool_skips_stage() {
    let env = TestEnvironment::new().unwrap();
    let runner = MockRunner::new();

    let summary = Orchestrator::new(env.options(), quiet_config())
        .with_runner(runner.clone())
        .with_availability(|tool: Tool| tool != Tool::HmmBuild)
        .run()
        .unwrap();

    assert_eq!(summary.profile.skipped, 2);
    assert_eq!(summary.profile.succeeded, 0);
    assert_eq!(runner.count(JobKind::ProfileBuild), 0);
    assert_eq!(runner.count(JobKind::Alignment), 2);
    assert!(!env.profile_file("OG_1").exists());
}

#[test]
fn test_failed_job_does_not_stop_batch() {
    let env = TestEnvironment::new().unwrap();
    let runner = MockRunner::failing(&["OG_1"]);

    let summary = run_with(env.options(), &runner);

    assert_eq!(summary.alignment.failed, 1);
    assert_eq!(summary.alignment.succeeded, 1);
    assert_eq!(summary.profile.failed, 1);
    assert!(env.profile_file("OG_4").exists());
    assert!(summary.has_failures());
    assert_eq!(summary.failed_jobs.len(), 2);
}

#[test]
fn test_missing_gene_set_is_fatal() {
    let env = TestEnvironment::new().unwrap();
    fs::remove_file(env.gene_set_dir.join("Mus musculus.fa")).unwrap();

    let result = Orchestrator::new(env.options(), quiet_config())
        .with_runner(MockRunner::new())
        .with_availability(all_tools)
        .run();

    match result {
        Err(OrthoprepError::AmbiguousOrMissingGeneSet { species, matches, .. }) => {
            assert_eq!(species, "Mus musculus");
            assert_eq!(matches, 0);
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_malformed_mapping_row_is_fatal() {
    let env = TestEnvironment::new().unwrap();
    fs::write(env.mapping_file(), "9606\tHomo sapiens\n").unwrap();
    let runner = MockRunner::new();

    let result = Orchestrator::new(env.options(), quiet_config())
        .with_runner(runner.clone())
        .with_availability(all_tools)
        .run();

    assert!(matches!(
        result,
        Err(OrthoprepError::MalformedMappingRow { line: 1, fields: 2 })
    ));
    assert!(runner.calls().is_empty());
}

#[test]
fn test_summary_json() {
    let env = TestEnvironment::new().unwrap();
    let summary = run_with(env.options(), &MockRunner::new());
    let path = env.temp_dir.path().join("summary.json");

    summary.write_json(&path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&read(&path)).unwrap();
    assert_eq!(value["groups_retained"], 2);
    assert_eq!(value["alignment"]["succeeded"], 2);
}

const HUMAN_ONLY_HEAD: &str = r#"<orthoXML>
  <species name="Homo sapiens">
    <database name="db"><genes>
      <gene id="1" protId="HS|1"/>
      <gene id="2" protId="HS2"/>
    </genes></database>
  </species>
  <groups>"#;

#[test]
fn test_colliding_group_ids_keep_first() {
    let document = format!(
        r#"{}
    <orthologGroup id="5"><geneRef id="1"/></orthologGroup>
    <orthologGroup id="OG_5"><geneRef id="2"/></orthologGroup>
  </groups>
</orthoXML>"#,
        HUMAN_ONLY_HEAD
    );
    let env = TestEnvironment::with_document(&document).unwrap();
    let mut options = env.options();
    options.min_taxa = 1;
    let runner = MockRunner::new();

    let summary = run_with(options, &runner);

    assert_eq!(summary.groups_extracted, 2);
    assert_eq!(summary.groups_retained, 1);
    assert_eq!(summary.duplicate_groups, vec!["OG_5".to_string()]);
    assert_eq!(runner.count(JobKind::Alignment), 1);
    assert_eq!(
        read(&env.group_fasta("OG_5")),
        format!(">OG_5|{}|HS_1\nMKVLAAGTRW\n", human_id())
    );
}

#[test]
fn test_group_with_empty_id_is_ignored() {
    let document = format!(
        r#"{}
    <orthologGroup id=""><geneRef id="1"/></orthologGroup>
    <orthologGroup id="9"><geneRef id="2"/></orthologGroup>
  </groups>
</orthoXML>"#,
        HUMAN_ONLY_HEAD
    );
    let env = TestEnvironment::with_document(&document).unwrap();
    let mut options = env.options();
    options.min_taxa = 1;
    options.max_groups = Some(1);
    let runner = MockRunner::new();

    let summary = run_with(options, &runner);

    assert_eq!(summary.groups_extracted, 1);
    assert!(!env.job_dir().join(".fa").exists());
    assert!(env.group_fasta("OG_9").exists());
    assert_eq!(runner.count(JobKind::Alignment), 1);
    assert!(!runner.calls().iter().any(|(_, label)| label.is_empty()));
}
