use super::*;

#[test]
fn prefix_matching_is_segment_aware() {
    assert!(is_under("/admin", "/admin"));
    assert!(is_under("/admin/users", "/admin"));
    assert!(is_under("/admin/", "/admin/"));
    assert!(!is_under("/admin-login", "/admin"));
    assert!(!is_under("/administrator", "/admin"));
}

#[test]
fn prefix_matching_ignores_query_string() {
    assert!(is_under("/dashboard?tab=likes", "/dashboard"));
    assert!(!is_under("/?next=/dashboard", "/dashboard"));
}

#[test]
fn default_table_protects_dashboards() {
    let table = RouteTable::default();
    assert!(table.is_protected("/dashboard"));
    assert!(table.is_protected("/dashboard/properties/12"));
    assert!(table.is_protected("/admin/users"));
    assert!(!table.is_protected("/admin-login"));
    assert!(!table.is_protected("/"));
    assert!(!table.is_protected("/properties"));
}

#[test]
fn assets_and_api_are_excluded() {
    let table = RouteTable::default();
    assert!(table.is_excluded("/api/auth/me"));
    assert!(table.is_excluded("/_next/static/chunk.js"));
    assert!(table.is_excluded("/favicon.ico"));
    assert!(table.is_excluded("/images/hero.jpg"));
    assert!(!table.is_excluded("/dashboard"));
}

#[test]
fn files_under_protected_areas_stay_guarded() {
    let table = RouteTable::default();
    assert!(!table.is_excluded("/dashboard/logo.png"));
    assert!(!table.is_excluded("/admin/index.html"));
    assert!(table.is_protected("/admin/index.html"));
    assert!(table.is_protected("/dashboard/report.pdf"));
}

#[test]
fn auth_only_pages() {
    let table = RouteTable::default();
    assert!(table.is_auth_only("/reset-password"));
    assert!(table.is_auth_only("/reset-password/abc123"));
    assert!(!table.is_auth_only("/dashboard"));
}

#[test]
fn admin_area_requires_admin_role() {
    let table = RouteTable::default();
    let area = table.area_for("/admin").unwrap();
    assert!(area.admits(Role::Admin));
    assert!(!area.admits(Role::User));
    let client = table.area_for("/dashboard").unwrap();
    assert!(client.admits(Role::Agent));
}

#[test]
fn home_and_login_paths_follow_role_and_scope() {
    let table = RouteTable::default();
    assert_eq!(table.home_for(Role::Admin), "/admin");
    assert_eq!(table.home_for(Role::Agent), "/dashboard");
    assert_eq!(table.login_for(SessionScope::Client), "/");
    assert_eq!(table.login_for(SessionScope::Admin), "/admin-login");
}
