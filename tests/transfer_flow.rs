mod common;

use std::sync::Arc;

use common::{ORG, config, seeded_store};
use initiative_forge::assessment::GatherRequest;
use initiative_forge::model::{DraftStatus, InitiativeDraft, SynthesisMode};
use initiative_forge::store::MemoryStore;
use initiative_forge::transfer::TransferRequest;
use initiative_forge::{DraftRequest, InitiativePipeline, PipelineStores};

async fn setup() -> (Arc<MemoryStore>, InitiativePipeline, Vec<InitiativeDraft>) {
    let store = seeded_store();
    let stores = PipelineStores::from_memory(store.clone()).await;
    let pipeline = InitiativePipeline::new(config(), stores, None);
    let request = DraftRequest {
        gather: GatherRequest {
            organization_id: ORG.into(),
            drd_assessment_id: "drd-1".into(),
            lean_assessment_id: None,
            external: vec![],
        },
        mode: SynthesisMode::Gap,
        constraints: Default::default(),
    };
    let batch = pipeline.generate_drafts(&request).await.unwrap();
    (store, pipeline, batch.drafts)
}

fn request(drafts: Vec<InitiativeDraft>) -> TransferRequest {
    TransferRequest {
        project_id: "proj-7".into(),
        source_assessment_id: Some("drd-1".into()),
        drafts,
    }
}

#[tokio::test]
async fn failing_drafts_are_isolated() {
    let (store, pipeline, mut drafts) = setup().await;
    assert_eq!(drafts.len(), 4);
    drafts[1].name = "abc".into();
    let invalid_id = drafts[1].id.clone();
    let rejected_id = drafts[2].id.clone();
    store.fail_inserts_for(&rejected_id).await;

    let report = pipeline.transfer(request(drafts.clone())).await.unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.transferred.len() + report.failed.len(), 4);
    assert_eq!(report.transferred.len(), 2);
    let failed: Vec<&str> = report.failed.iter().map(|f| f.draft_id.as_str()).collect();
    assert_eq!(failed, vec![invalid_id.as_str(), rejected_id.as_str()]);
    assert!(
        report
            .transferred
            .iter()
            .all(|t| t.draft_id != invalid_id && t.draft_id != rejected_id)
    );
    assert!(report.failed[0].errors[0].contains("name"));

    let initiatives = store.initiatives().await;
    assert_eq!(initiatives.len(), 2);
    assert!(initiatives.iter().all(|i| i.status == DraftStatus::Approved));
    assert!(initiatives.iter().all(|i| i.project_id == "proj-7"));

    let links = store.links().await;
    assert_eq!(links.len(), 2);
    assert!(links.iter().all(|(_, a)| a == "drd-1"));

    assert_eq!(store.mark_count("drd-1").await, 1);

    let remaining = pipeline.stored_drafts("drd-1").await.unwrap();
    let remaining: Vec<&str> = remaining.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(remaining, vec![invalid_id.as_str(), rejected_id.as_str()]);

    let audit = store.audit_entries().await;
    assert!(audit.iter().any(|e| e.kind == "transfer"));
}

#[tokio::test]
async fn blank_project_is_an_input_error() {
    let (store, pipeline, drafts) = setup().await;
    let mut req = request(drafts);
    req.project_id = "  ".into();
    let err = pipeline.transfer(req).await.unwrap_err();
    assert!(err.is_input_error());
    assert!(store.initiatives().await.is_empty());
    assert_eq!(store.mark_count("drd-1").await, 0);
}

#[tokio::test]
async fn approved_drafts_are_not_transferred_twice() {
    let (store, pipeline, mut drafts) = setup().await;
    drafts.truncate(1);
    drafts[0].status = DraftStatus::Approved;
    let report = pipeline.transfer(request(drafts)).await.unwrap();
    assert!(report.transferred.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert!(store.initiatives().await.is_empty());
    assert_eq!(store.mark_count("drd-1").await, 0);
}

#[tokio::test]
async fn unknown_assessment_mark_does_not_fail_the_batch() {
    let (store, pipeline, mut drafts) = setup().await;
    drafts.truncate(2);
    for d in drafts.iter_mut() {
        d.source_assessment_id = Some("ghost".into());
    }
    let mut req = request(drafts);
    req.source_assessment_id = None;
    let report = pipeline.transfer(req).await.unwrap();
    assert_eq!(report.transferred.len(), 2);
    assert_eq!(store.mark_count("ghost").await, 0);
    assert!(store.links().await.iter().all(|(_, a)| a == "ghost"));
    // drafts for drd-1 were not touched
    assert_eq!(pipeline.stored_drafts("drd-1").await.unwrap().len(), 4);
}

#[tokio::test]
async fn validation_reports_errors_and_warnings() {
    let (_store, pipeline, drafts) = setup().await;
    let ok = pipeline.validate(&drafts[0]);
    assert!(ok.valid);
    assert!(ok.errors.is_empty());

    let mut bad = drafts[0].clone();
    bad.description = "too short".into();
    bad.estimated_budget = 0;
    bad.estimated_roi = 0.4;
    let result = pipeline.validate(&bad);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 2);
    assert!(result.warnings.iter().any(|w| w.contains("ROI")));
}
