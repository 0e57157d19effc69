use super::*;

#[test]
fn extracts_single_marker() {
    let markers = extract_markers("hello\nTRIGGER:C\n");
    assert_eq!(markers, HashSet::from(["C".to_string()]));
}

#[test]
fn extracts_marker_with_surrounding_whitespace() {
    let markers = extract_markers("  TRIGGER:C  \nnoise");
    assert_eq!(markers, HashSet::from(["C".to_string()]));
}

#[test]
fn ignores_lines_without_prefix() {
    let markers = extract_markers("no markers here\nneither here");
    assert!(markers.is_empty());
}

#[test]
fn resolve_targets_returns_intersection_when_markers_present() {
    let triggers_rules = vec!["C".to_string(), "D".to_string()];
    let markers = HashSet::from(["C".to_string()]);
    assert_eq!(resolve_targets(&triggers_rules, &markers), vec!["C"]);
}

#[test]
fn resolve_targets_returns_all_when_no_markers() {
    let triggers_rules = vec!["C".to_string(), "D".to_string()];
    let markers = HashSet::new();
    assert_eq!(resolve_targets(&triggers_rules, &markers), vec!["C", "D"]);
}

#[test]
fn resolve_targets_ignores_markers_outside_triggers_rules() {
    let triggers_rules = vec!["C".to_string()];
    let markers = HashSet::from(["D".to_string()]);
    assert!(resolve_targets(&triggers_rules, &markers).is_empty());
}
