#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use initiative_forge::assessment::{
    ExternalAssessment, ExternalAxis, FrameworkRecord, LeanAssessment, LeanAxis,
};
use initiative_forge::clients::{GeneratorError, TextGenerator};
use initiative_forge::config::Config;
use initiative_forge::model::{
    Assessment, AssessmentSource, DimensionScore, GapInput, WorkflowStatus,
};
use initiative_forge::store::MemoryStore;
use initiative_forge::store::memory::{FrameworkEntry, Snapshot};

pub const ORG: &str = "org-1";

/// How the scripted generator answers one section
#[derive(Clone)]
pub enum Script {
    Reply(String),
    Fail,
    Hang,
}

/// Text generator that answers per section from a fixed script; unscripted
/// sections fail
#[derive(Default)]
pub struct ScriptedGenerator {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, section: &str, body: &str) -> Self {
        self.scripts
            .insert(section.to_string(), Script::Reply(body.to_string()));
        self
    }

    pub fn hang(mut self, section: &str) -> Self {
        self.scripts.insert(section.to_string(), Script::Hang);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _prompt: &str, section: &str) -> Result<String, GeneratorError> {
        self.calls.lock().unwrap().push(section.to_string());
        match self.scripts.get(section).cloned().unwrap_or(Script::Fail) {
            Script::Reply(body) => Ok(body),
            Script::Fail => Err(GeneratorError::Http("503 service unavailable".into())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GeneratorError::Http("unreachable".into()))
            }
        }
    }
}

pub fn config() -> Config {
    let mut cfg = Config::default();
    cfg.generation.section_timeout_ms = 200;
    cfg
}

pub fn dim(dimension: &str, as_is: f64, to_be: f64) -> DimensionScore {
    DimensionScore {
        dimension: dimension.into(),
        as_is,
        to_be,
        top_gap: false,
    }
}

pub fn drd_assessment() -> Assessment {
    Assessment {
        id: "drd-1".into(),
        source: AssessmentSource::Drd,
        source_id: "drd-1".into(),
        organization_id: Some(ORG.into()),
        dimensions: vec![
            dim("processes", 3.0, 5.0),
            dim("dataManagement", 1.0, 5.0),
            dim("culture", 3.0, 4.0),
            dim("cybersecurity", 2.0, 5.0),
            dim("aiMaturity", 4.0, 4.0),
        ],
        workflow_status: WorkflowStatus::Completed,
        project_id: None,
        initiatives_generated: false,
    }
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        assessments: vec![drd_assessment()],
        frameworks: vec![
            FrameworkEntry {
                framework: "lean".into(),
                organization_id: ORG.into(),
                record: FrameworkRecord::Lean(LeanAssessment {
                    id: "lean-1".into(),
                    axes: vec![
                        LeanAxis {
                            axis: "standardWork".into(),
                            score: 1.5,
                            industry_benchmark: 4.5,
                        },
                        LeanAxis {
                            axis: "flow".into(),
                            score: 2.0,
                            industry_benchmark: 4.0,
                        },
                    ],
                    top_gaps: vec!["standardWork".into()],
                }),
            },
            FrameworkEntry {
                framework: "iso".into(),
                organization_id: ORG.into(),
                record: FrameworkRecord::External(ExternalAssessment {
                    id: "iso-1".into(),
                    framework: "iso".into(),
                    axes: vec![
                        ExternalAxis {
                            axis: "governance".into(),
                            score: 2.0,
                            scale_max: 5.0,
                        },
                        ExternalAxis {
                            axis: "automation".into(),
                            score: 4.0,
                            scale_max: 5.0,
                        },
                    ],
                }),
            },
        ],
        ..Default::default()
    }
}

pub fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_snapshot(snapshot()))
}

pub fn gap_input(dimension: &str, as_is: f64, to_be: f64) -> GapInput {
    GapInput {
        dimension: dimension.into(),
        as_is,
        to_be,
        source: AssessmentSource::Drd,
        source_id: Some("drd-1".into()),
    }
}
