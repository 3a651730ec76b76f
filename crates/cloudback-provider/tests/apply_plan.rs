mod common;

use std::collections::BTreeMap;

use cloudback_provider::config::ConfigDoc;
use cloudback_provider::error::RemoteError;
use cloudback_provider::executor;
use cloudback_provider::model::{BackupDefinition, Settings};
use cloudback_provider::planner::{self, Action};
use cloudback_provider::resource::BackupDefinitionResource;
use cloudback_provider::state::{self, StateDoc};
use cloudback_provider::store::RemoteStore;

use common::{InMemoryStore, key, settings};

fn doc(raw: &str) -> ConfigDoc {
    ConfigDoc {
        value: toml::from_str(raw).expect("parse toml"),
    }
}

const TWO_DEFINITIONS: &str = r#"
[definitions.docs]
platform = "GitHub"
account = "testland"
repository = "docs"
settings = { enabled = true, schedule = "Daily at 9 pm", storage = "Cloudback EU", retention = "Last 30 days" }

[definitions.infra]
platform = "GitHub"
account = "testland"
subject_type = "Project"
subject_name = "infra"
settings = { enabled = true, schedule = "Daily at 9 pm", storage = "Cloudback EU", retention = "Last 30 days" }
"#;

fn declared(raw: &str) -> BTreeMap<String, BackupDefinition> {
    doc(raw).definitions().expect("definitions")
}

#[test]
fn first_apply_creates_everything_and_persists_state() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let state_path = tmp.path().join("state.json");
    let store = InMemoryStore::default();
    let resource = BackupDefinitionResource::new(&store);

    let mut st = state::load(&state_path).expect("load");
    let plan = planner::plan(&declared(TWO_DEFINITIONS), &st).expect("plan");
    assert_eq!(plan.count(Action::Create), 2);

    let report = executor::apply(&resource, &plan, &mut st, &state_path).expect("apply");
    assert_eq!(report.created, 2);
    assert_eq!(store.get(&key("Repository", "docs")), Some(settings(true)));
    assert_eq!(store.get(&key("Project", "infra")), Some(settings(true)));

    let reloaded = state::load(&state_path).expect("reload");
    assert_eq!(reloaded.resources.len(), 2);

    let again = planner::plan(&declared(TWO_DEFINITIONS), &reloaded).expect("replan");
    assert!(again.is_empty());
}

#[test]
fn removing_a_definition_disables_it_remotely() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let state_path = tmp.path().join("state.json");
    let store = InMemoryStore::default();
    let resource = BackupDefinitionResource::new(&store);

    let mut st = StateDoc::default();
    let plan = planner::plan(&declared(TWO_DEFINITIONS), &st).expect("plan");
    executor::apply(&resource, &plan, &mut st, &state_path).expect("apply");

    let only_docs: BTreeMap<_, _> = declared(TWO_DEFINITIONS)
        .into_iter()
        .filter(|(name, _)| name == "docs")
        .collect();
    let plan = planner::plan(&only_docs, &st).expect("plan");
    let report = executor::apply(&resource, &plan, &mut st, &state_path).expect("apply");
    assert_eq!(report.deleted, 1);
    assert_eq!(store.get(&key("Project", "infra")), Some(Settings::disabled()));
    assert!(st.record("infra").is_none());
}

#[test]
fn failed_change_aborts_and_keeps_state_consistent() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let state_path = tmp.path().join("state.json");
    let store = InMemoryStore::default();
    store.fail_all_calls(RemoteError::Transport("connection reset".into()));
    let resource = BackupDefinitionResource::new(&store);

    let mut st = StateDoc::default();
    let plan = planner::plan(&declared(TWO_DEFINITIONS), &st).expect("plan");
    let err = executor::apply(&resource, &plan, &mut st, &state_path).unwrap_err();
    assert!(err.to_string().contains("connection reset"));
    assert_eq!(store.calls().len(), 1, "no retry and no further changes");
    assert!(st.resources.is_empty());
}

#[test]
fn refresh_picks_up_remote_drift() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let state_path = tmp.path().join("state.json");
    let store = InMemoryStore::default();
    let resource = BackupDefinitionResource::new(&store);

    let mut st = StateDoc::default();
    let plan = planner::plan(&declared(TWO_DEFINITIONS), &st).expect("plan");
    executor::apply(&resource, &plan, &mut st, &state_path).expect("apply");

    store
        .upsert_definition(&key("Repository", "docs"), &settings(false))
        .expect("out-of-band change");

    let n = executor::refresh(&resource, &mut st, &state_path).expect("refresh");
    assert_eq!(n, 2);
    assert!(!st.record("docs").expect("docs").settings.enabled);

    let plan = planner::plan(&declared(TWO_DEFINITIONS), &st).expect("plan");
    assert_eq!(plan.count(Action::Update), 1);
}

#[test]
fn import_then_plan_has_no_changes() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let state_path = tmp.path().join("state.json");
    let store = InMemoryStore::seeded(key("Repository", "docs"), settings(true));
    let resource = BackupDefinitionResource::new(&store);

    let mut st = StateDoc::default();
    executor::import(&resource, &mut st, &state_path, "docs", "GitHub/testland/docs")
        .expect("import");
    let err = executor::import(&resource, &mut st, &state_path, "docs", "GitHub/testland/docs")
        .unwrap_err();
    assert!(err.to_string().contains("already managed"));

    let only_docs: BTreeMap<_, _> = declared(TWO_DEFINITIONS)
        .into_iter()
        .filter(|(name, _)| name == "docs")
        .collect();
    let plan = planner::plan(&only_docs, &st).expect("plan");
    assert!(plan.is_empty());
}

#[test]
fn import_rejects_key_already_managed_under_another_name() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let state_path = tmp.path().join("state.json");
    let store = InMemoryStore::seeded(key("Repository", "docs"), settings(true));
    let resource = BackupDefinitionResource::new(&store);

    let mut st = StateDoc::default();
    executor::import(&resource, &mut st, &state_path, "docs", "GitHub/testland/docs")
        .expect("import");
    let calls_after_first = store.calls().len();

    let err = executor::import(
        &resource,
        &mut st,
        &state_path,
        "docs-again",
        "GitHub/testland/Repository/docs",
    )
    .unwrap_err();
    assert!(
        err.to_string()
            .contains("GitHub/testland/Repository/docs is already managed as 'docs'")
    );
    assert_eq!(store.calls().len(), calls_after_first, "no remote read");
    assert!(st.record("docs-again").is_none());
    assert_eq!(state::load(&state_path).expect("reload").resources.len(), 1);
}

#[test]
fn failed_claiming_create_keeps_handed_over_entry() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let state_path = tmp.path().join("state.json");
    let store = InMemoryStore::default();
    let resource = BackupDefinitionResource::new(&store);

    let mut st = StateDoc::default();
    let plan = planner::plan(&declared(TWO_DEFINITIONS), &st).expect("plan");
    executor::apply(&resource, &plan, &mut st, &state_path).expect("apply");

    let renamed = TWO_DEFINITIONS.replace("[definitions.docs]", "[definitions.handbook]");
    let plan = planner::plan(&declared(&renamed), &st).expect("plan");
    assert_eq!(plan.count(Action::Create), 1);
    assert_eq!(plan.count(Action::Delete), 1);

    store.fail_all_calls(RemoteError::Transport("connection reset".into()));
    executor::apply(&resource, &plan, &mut st, &state_path).unwrap_err();

    let reloaded = state::load(&state_path).expect("reload");
    assert!(reloaded.record("docs").is_some());
    assert!(reloaded.record("handbook").is_none());
}

#[test]
fn destroy_disables_and_forgets() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let state_path = tmp.path().join("state.json");
    let store = InMemoryStore::default();
    let resource = BackupDefinitionResource::new(&store);

    let mut st = StateDoc::default();
    let plan = planner::plan(&declared(TWO_DEFINITIONS), &st).expect("plan");
    executor::apply(&resource, &plan, &mut st, &state_path).expect("apply");

    assert!(executor::destroy(&resource, &mut st, &state_path, Some("nope")).is_err());
    let n = executor::destroy(&resource, &mut st, &state_path, None).expect("destroy");
    assert_eq!(n, 2);
    assert!(st.resources.is_empty());
    assert_eq!(store.get(&key("Repository", "docs")), Some(Settings::disabled()));
    assert!(state::load(&state_path).expect("reload").resources.is_empty());
}

#[test]
fn moving_subject_replaces_and_disables_old_key() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let state_path = tmp.path().join("state.json");
    let store = InMemoryStore::default();
    let resource = BackupDefinitionResource::new(&store);

    let mut st = StateDoc::default();
    let plan = planner::plan(&declared(TWO_DEFINITIONS), &st).expect("plan");
    executor::apply(&resource, &plan, &mut st, &state_path).expect("apply");

    let moved = TWO_DEFINITIONS.replace("repository = \"docs\"", "repository = \"handbook\"");
    let plan = planner::plan(&declared(&moved), &st).expect("plan");
    let report = executor::apply(&resource, &plan, &mut st, &state_path).expect("apply");
    assert_eq!(report.replaced, 1);
    assert_eq!(store.get(&key("Repository", "docs")), Some(Settings::disabled()));
    assert_eq!(store.get(&key("Repository", "handbook")), Some(settings(true)));
    assert_eq!(
        st.record("docs").and_then(|r| r.repository.as_deref()),
        Some("handbook")
    );
}
