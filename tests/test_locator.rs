use build_cleaner::{
    BuildFolderSelector, ExclusionRule, ExclusionRules, Options, RecursiveFolderLocator,
};
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn create_dirs(root: &Path, dirs: &[&str]) {
    for dir in dirs {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
}

fn default_rules() -> ExclusionRules {
    ExclusionRules::new(vec![
        ExclusionRule::SymbolicLinks,
        ExclusionRule::DotFolders,
        ExclusionRule::subtree("node_modules"),
    ])
}

fn locate<S>(root: &Path, rules: ExclusionRules, selector: S) -> Vec<PathBuf>
where
    S: build_cleaner::FolderSelector,
{
    RecursiveFolderLocator::new(rules)
        .walk(root, selector)
        .unwrap()
        .collect()
}

#[test]
fn test_walk_is_depth_first_and_sorted() {
    let dir = tempdir().unwrap();
    let base = dunce::canonicalize(dir.path()).unwrap();
    create_dirs(&base, &["b/x", "A/y", "a2", "c"]);

    let all = locate(&base, default_rules(), |_: &Path| false);

    // Nothing is selected, so every folder is descended but none yielded
    assert!(all.is_empty());

    let found = locate(&base, default_rules(), |_: &Path| true);
    assert_eq!(
        found,
        vec![base.join("A"), base.join("a2"), base.join("b"), base.join("c")]
    );
}

#[test]
fn test_leaf_selection_descends_parents() {
    let dir = tempdir().unwrap();
    let base = dunce::canonicalize(dir.path()).unwrap();
    create_dirs(&base, &["b/x", "A/y", "c"]);

    let found = locate(&base, default_rules(), |p: &Path| {
        matches!(p.file_name().and_then(|n| n.to_str()), Some("x" | "y"))
    });

    assert_eq!(found, vec![base.join("A/y"), base.join("b/x")]);
}

#[test]
fn test_excluded_subtrees_are_not_entered() {
    let dir = tempdir().unwrap();
    let base = dunce::canonicalize(dir.path()).unwrap();
    create_dirs(&base, &[".git/bin", "node_modules/pkg/bin", "src/App/bin", "src/App/obj"]);
    fs::write(base.join("src/App/App.csproj"), "<Project />").unwrap();
    fs::write(base.join("node_modules/pkg/Pkg.csproj"), "<Project />").unwrap();

    let selector = BuildFolderSelector::new(["bin", "obj"], ["*.csproj"]).unwrap();
    let found = locate(&base, default_rules(), selector);

    assert_eq!(found, vec![base.join("src/App/bin"), base.join("src/App/obj")]);
}

#[test]
fn test_glob_rule_prunes_matching_folders() {
    let dir = tempdir().unwrap();
    let base = dunce::canonicalize(dir.path()).unwrap();
    create_dirs(&base, &["packages/Lib/bin", "App/bin"]);
    fs::write(base.join("packages/Lib/Lib.csproj"), "<Project />").unwrap();
    fs::write(base.join("App/App.csproj"), "<Project />").unwrap();

    let rules = ExclusionRules::new(vec![ExclusionRule::glob("**/packages").unwrap()]);
    let selector = BuildFolderSelector::new(["bin"], ["*.csproj"]).unwrap();

    assert_eq!(locate(&base, rules, selector), vec![base.join("App/bin")]);
}

#[test]
fn test_visit_stops_when_visitor_breaks() {
    let dir = tempdir().unwrap();
    let base = dunce::canonicalize(dir.path()).unwrap();
    create_dirs(&base, &["a", "b", "c"]);

    let mut seen = Vec::new();
    let issues = RecursiveFolderLocator::new(default_rules())
        .visit(
            &base,
            |folder, _| {
                seen.push(folder.to_path_buf());
                if seen.len() == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
            |_: &Path| true,
            &Options::default(),
        )
        .unwrap();

    assert_eq!(seen, vec![base.join("a"), base.join("b")]);
    assert!(issues.is_empty());
}

#[test]
fn test_visit_rejects_missing_root() {
    let dir = tempdir().unwrap();
    let base = dunce::canonicalize(dir.path()).unwrap();
    let missing = base.join("absent");

    let err = RecursiveFolderLocator::new(default_rules())
        .visit(
            &missing,
            |_, _| ControlFlow::Continue(()),
            |_: &Path| true,
            &Options::default(),
        )
        .unwrap_err();

    assert!(err.to_string().contains("Unable to find directory"));
}

#[cfg(unix)]
#[test]
fn test_symlinked_folders_are_not_followed() {
    let dir = tempdir().unwrap();
    let base = dunce::canonicalize(dir.path()).unwrap();
    let outside = tempdir().unwrap();
    create_dirs(outside.path(), &["bin"]);
    create_dirs(&base, &["real"]);
    std::os::unix::fs::symlink(outside.path(), base.join("link")).unwrap();

    let found = locate(&base, default_rules(), |_: &Path| true);

    assert_eq!(found, vec![base.join("real")]);
}

#[test]
fn test_root_with_parent_components_respects_ancestor_rule() {
    let dir = tempdir().unwrap();
    let base = dunce::canonicalize(dir.path()).unwrap();
    create_dirs(&base, &["tools/bin", "x"]);

    let rules = ExclusionRules::new(vec![ExclusionRule::ancestor_path(base.join("tools/bin"))]);
    let found = locate(&base.join("x/../tools"), rules, |p: &Path| p.ends_with("bin"));

    assert!(found.is_empty());
}
