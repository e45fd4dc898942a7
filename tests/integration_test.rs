//! Library-level integration tests: registry persistence, tree synthesis,
//! and step rewriting working together, with in-memory providers.

use std::fs;
use std::path::{Path, PathBuf};

use action_synth::paths::locate_registry;
use action_synth::provider::{DirectoryWorkingCopy, MemoryRevisionProvider};
use action_synth::reference::ActionReference;
use action_synth::registry::{RegistryFormat, RegistryStore};
use action_synth::rewrite::rewrite_workflow;
use action_synth::synthesis::{Outcome, TreeSynthesizer};
use tempfile::TempDir;

const CHECKOUT_SHA: &str = "11bd71901bbe5b1630ceea73d27597364c9af683";
const CODEQL_SHA: &str = "662472033e021d55d94146f66f6058822b0b39fd";

struct Project {
    _temp: TempDir,
    root: PathBuf,
    repos: PathBuf,
}

impl Project {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("project");
        let repos = temp.path().join("repos");
        fs::create_dir_all(root.join(".git")).unwrap();
        Self {
            _temp: temp,
            root,
            repos,
        }
    }

    fn schema(&self, org_repo: &str, subpath: &str, content: &str) {
        let dir = self.repos.join(org_repo).join(subpath);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("action.yml"), content).unwrap();
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root.join(relative)).unwrap()
    }
}

fn revisions() -> MemoryRevisionProvider {
    MemoryRevisionProvider::new()
        .with_tag("actions/checkout", "v4.2.2", CHECKOUT_SHA)
        .with_tag("actions/checkout", "v4", CHECKOUT_SHA)
        .with_tag("github/codeql-action", "v3", CODEQL_SHA)
}

fn working_copies(project: &Project) -> DirectoryWorkingCopy {
    DirectoryWorkingCopy::new()
        .with_repo("actions/checkout", project.repos.join("actions/checkout"))
        .with_repo(
            "github/codeql-action",
            project.repos.join("github/codeql-action"),
        )
}

fn populate(project: &Project) {
    project.schema(
        "actions/checkout",
        "",
        "name: Checkout\ndescription: Checkout a Git repository\ninputs:\n  fetch-depth:\n    description: Number of commits to fetch\n    default: 1\n",
    );
    project.schema(
        "github/codeql-action",
        "init",
        "name: CodeQL\ninputs:\n  languages:\n    description: Languages to analyze\n",
    );
    project.schema(
        "github/codeql-action",
        "analyze",
        "name: CodeQL\noutputs:\n  sarif-output:\n    description: Output directory\n",
    );
}

fn add_both(project: &Project, store: &mut RegistryStore) {
    let revisions = revisions();
    let copies = working_copies(project);
    let synthesizer = TreeSynthesizer::new(&revisions, &copies);
    let mut registry = store.load().unwrap();

    for reference in ["actions/checkout", "github/codeql-action@v3"] {
        let report = synthesizer
            .add(
                &mut registry,
                store.resolver(),
                &ActionReference::parse(reference).unwrap(),
                None,
            )
            .unwrap();
        assert_eq!(report.outcome(), Outcome::Complete);
    }
    store.save(&mut registry).unwrap();
}

#[test]
fn test_yaml_registry_end_to_end() {
    let project = Project::new();
    populate(&project);
    let document = project.root.join(".action-synth/actions.yml");
    let mut store = RegistryStore::new(&document);
    assert_eq!(store.format(), RegistryFormat::Yaml);

    add_both(&project, &mut store);

    let location = locate_registry(&project.root);
    assert!(location.exists);
    assert_eq!(location.path, document);

    let reloaded = RegistryStore::new(&document).load().unwrap();
    let identifiers: Vec<&str> = reloaded
        .actions
        .iter()
        .map(|e| e.generated_identifier.as_str())
        .collect();
    assert_eq!(identifiers, vec!["Checkout", "CodeqlAnalyze", "CodeqlInit"]);
    assert!(project.read(".action-synth/actions.yml").contains("orgRepo: actions/checkout"));

    assert_eq!(
        project.read("generated/actions/github/codeql-action/index.ts"),
        "// Generated by action-synth. Do not edit.\n\nexport * from './analyze';\nexport * from './init';\n"
    );
    assert_eq!(
        project.read("generated/actions/index.ts"),
        "// Generated by action-synth. Do not edit.\n\nexport * as actions from './actions';\nexport * as github from './github';\n"
    );
}

#[test]
fn test_rewrite_against_synthesized_tree() {
    let project = Project::new();
    populate(&project);
    let mut store = RegistryStore::new(&project.root.join(".action-synth/actions.json"));
    add_both(&project, &mut store);
    let registry = store.load().unwrap();

    let workflow = "jobs:\n  analyze:\n    steps:\n      - uses: actions/checkout@v4\n        with:\n          fetch-depth: 0\n      - uses: github/codeql-action/init@v3\n      - uses: github/codeql-action/analyze@v3\n";
    let out_dir = project.root.join("src/workflows");
    let result = rewrite_workflow(
        workflow,
        ".github/workflows/codeql.yml",
        &registry,
        store.resolver(),
        &out_dir,
    )
    .unwrap();

    assert_eq!(result.rewritten, 3);
    assert!(result.unmatched.is_empty());

    // every import resolves to a module on disk
    for line in result.source.lines().filter(|l| l.starts_with("import")) {
        let specifier = line
            .rsplit(" from '")
            .next()
            .unwrap()
            .trim_end_matches("';");
        let target = out_dir.join(format!("{}.ts", specifier));
        assert!(
            normalize(&target).is_file(),
            "{} does not resolve",
            specifier
        );
    }
}

#[test]
fn test_toml_registry_survives_update_and_remove() {
    let project = Project::new();
    populate(&project);
    let document = project.root.join(".action-synth/actions.toml");
    let mut store = RegistryStore::new(&document);
    add_both(&project, &mut store);

    let revisions = revisions();
    let copies = working_copies(&project);
    let synthesizer = TreeSynthesizer::new(&revisions, &copies);
    let mut registry = store.load().unwrap();

    let report = synthesizer
        .update(&mut registry, store.resolver(), "actions/checkout", None)
        .unwrap();
    assert_eq!(report.generated.len(), 1);
    assert_eq!(report.pinned_revision.as_deref(), Some(CHECKOUT_SHA));
    assert_eq!(report.display_version.as_deref(), Some("v4"));

    synthesizer
        .remove(&mut registry, store.resolver(), "github/codeql-action", None)
        .unwrap();
    store.save(&mut registry).unwrap();

    let text = project.read(".action-synth/actions.toml");
    assert!(text.contains("orgRepo = \"actions/checkout\""));
    assert!(!text.contains("codeql-action"));
    assert!(!project.root.join("generated/actions/github").exists());
}

fn normalize(path: &Path) -> PathBuf {
    action_synth::paths::normalize(path)
}
