//! Unit tests for classification and skip/block rules

use fscrape::services::filter::{FilterEngine, absolutize};
use fscrape::{Category, ScanConfig};
use std::path::Path;

fn engine(configure: impl FnOnce(&mut ScanConfig)) -> FilterEngine {
    let mut config = ScanConfig::for_roots(["/u"]);
    configure(&mut config);
    FilterEngine::new(&config).unwrap()
}

#[test]
fn classification_ignores_extension_case() {
    let filter = engine(|_| {});

    assert_eq!(filter.classify(Path::new("/u/a.TXT")), Some(Category::Text));
    assert_eq!(filter.classify(Path::new("/u/b.Jpeg")), Some(Category::Image));
    assert_eq!(filter.classify(Path::new("/u/c.MKV")), Some(Category::Video));
    assert_eq!(filter.classify(Path::new("/u/d.asc")), Some(Category::Text));
}

#[test]
fn unknown_or_missing_extension_is_unclassified() {
    let filter = engine(|_| {});

    assert_eq!(filter.classify(Path::new("/u/archive.zip")), None);
    assert_eq!(filter.classify(Path::new("/u/Makefile")), None);
    assert_eq!(filter.classify(Path::new("/u/.txt")), None);
}

#[test]
fn unrequested_category_is_excluded_but_still_known() {
    let filter = engine(|c| c.categories = [Category::Text].into_iter().collect());

    assert_eq!(filter.classify(Path::new("/u/img.png")), None);
    assert_eq!(
        filter.category_of(Path::new("/u/img.png")),
        Some(&Category::Image)
    );
}

#[test]
fn custom_group_cannot_take_builtin_extension() {
    let filter = engine(|c| {
        c.custom_categories.insert(
            "notes".to_string(),
            vec!["txt".to_string(), "md".to_string()],
        );
        c.categories.insert(Category::Custom("notes".to_string()));
    });

    assert_eq!(filter.classify(Path::new("/u/a.txt")), Some(Category::Text));
    assert_eq!(
        filter.classify(Path::new("/u/b.MD")),
        Some(Category::Custom("notes".to_string()))
    );
}

#[test]
fn skip_and_block_cover_descendants_only() {
    let filter = engine(|c| {
        c.skip.push("/u/docs/tmp".into());
        c.block.push("/u/docs/archive".into());
    });
    let root = Path::new("/u");

    assert!(filter.is_skipped(Path::new("/u/docs/tmp"), root));
    assert!(filter.is_skipped(Path::new("/u/docs/tmp/deep/er"), root));
    assert!(!filter.is_skipped(Path::new("/u/docs/tmpfiles"), root));
    assert!(!filter.is_skipped(Path::new("/u/docs"), root));

    assert!(filter.is_blocked(Path::new("/u/docs/archive/2020")));
    assert!(!filter.is_blocked(Path::new("/u/docs/archived")));
    assert!(!filter.is_skipped(Path::new("/u/docs/archive"), root));
}

#[test]
fn relative_entries_are_resolved_against_working_directory() {
    let filter = engine(|c| c.skip.push("cache/../tmp".into()));
    let expected = absolutize(Path::new("tmp")).unwrap();

    assert!(filter.is_skipped(&expected, Path::new("/")));
    assert!(filter.is_skipped(&expected.join("x"), Path::new("/")));
}

#[test]
fn skip_patterns_match_components_below_root_ignoring_case() {
    let filter = engine(|c| {
        c.skip_patterns = vec!["AppData".to_string(), "*.cache".to_string()];
    });
    let root = Path::new("/u");

    assert!(filter.is_skipped(Path::new("/u/appdata"), root));
    assert!(filter.is_skipped(Path::new("/u/APPDATA/Local"), root));
    assert!(filter.is_skipped(Path::new("/u/build/thumbs.CACHE"), root));
    assert!(!filter.is_skipped(Path::new("/u/AppDataBackup"), root));
}

#[test]
fn skip_patterns_ignore_components_above_root() {
    let filter = engine(|c| c.skip_patterns = vec!["AppData".to_string()]);
    let root = Path::new("/u/AppData/Roaming/Keep");

    assert!(!filter.is_skipped(root, root));
    assert!(!filter.is_skipped(&root.join("notes"), root));
    assert!(filter.is_skipped(&root.join("nested/appdata"), root));
}

#[test]
fn evaluation_is_pure() {
    let filter = engine(|c| c.block.push("/u/b".into()));
    let path = Path::new("/u/b/c.png");

    for _ in 0..3 {
        assert_eq!(filter.classify(path), Some(Category::Image));
        assert!(filter.is_blocked(Path::new("/u/b")));
    }
}
