//! Context binding: the set-branches may lazily start a session, the
//! remove-branches never do, and bound state round-trips through resolution.

use palisade::identity::{AUTHENTICATED_SESSION_KEY, PRINCIPALS_SESSION_KEY};
use palisade::web::Session;
use palisade::{
    Account, Base64JsonSerializer, PrincipalCollection, SecurityContext, SessionMode, WebRequest,
    WebResponse, WebSecurityManager,
};

fn manager() -> WebSecurityManager {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let mut m = WebSecurityManager::new(SessionMode::Native);
    m.set_remember_me_serializer(Box::new(Base64JsonSerializer));
    m
}

fn principals(names: &[&str]) -> PrincipalCollection {
    names.iter().copied().collect()
}

fn echo_cookies(response: &WebResponse) -> WebRequest {
    let mut request = WebRequest::new();
    for (name, value) in response.cookies() {
        request = request.with_cookie(name, value);
    }
    request
}

#[test]
fn bind_then_build_reproduces_the_context() {
    let m = manager();
    let request = WebRequest::new();
    let mut response = WebResponse::new();

    let mut ctx = SecurityContext::new(principals(&["alice", "uid-1"]), true, None, None).unwrap();
    m.bind_context(&mut ctx, &request, &mut response).unwrap();
    assert!(ctx.session().is_some(), "bind attaches the session it started");

    let rebuilt = m.build_context(&echo_cookies(&response), &WebResponse::new());
    assert_eq!(rebuilt.principals(), ctx.principals());
    assert!(rebuilt.authenticated());
}

#[test]
fn binding_an_anonymous_context_does_not_create_a_session() {
    let m = manager();
    let request = WebRequest::new();
    let mut response = WebResponse::new();

    let mut ctx = m.build_context(&request, &response);
    assert!(ctx.principals().is_empty());
    m.bind_context(&mut ctx, &request, &mut response).unwrap();

    assert!(ctx.session().is_none());
    assert_eq!(response.cookies().count(), 0, "no session cookie should be issued");
}

#[test]
fn logout_removes_both_attributes_from_the_session() {
    let m = manager();

    // Login and bind.
    let login_req = WebRequest::new();
    let mut login_resp = WebResponse::new();
    let mut ctx = m.build_context(&login_req, &login_resp);
    ctx.login(&Account::new(principals(&["carol"]))).unwrap();
    m.bind_context(&mut ctx, &login_req, &mut login_resp).unwrap();
    let session = ctx.session().unwrap().clone();
    assert!(session.get_attribute(PRINCIPALS_SESSION_KEY).is_some());
    assert_eq!(
        session.get_attribute(AUTHENTICATED_SESSION_KEY),
        Some(serde_json::Value::Bool(true))
    );

    // Logout on a later request carrying the session cookie.
    let out_req = echo_cookies(&login_resp);
    let mut out_resp = WebResponse::new();
    let mut ctx = m.build_context(&out_req, &out_resp);
    assert!(ctx.authenticated());
    ctx.logout();
    m.bind_context(&mut ctx, &out_req, &mut out_resp).unwrap();

    // Removed, not set to false / empty.
    assert_eq!(session.get_attribute(PRINCIPALS_SESSION_KEY), None);
    assert_eq!(session.get_attribute(AUTHENTICATED_SESSION_KEY), None);

    let rebuilt = m.build_context(&echo_cookies(&login_resp), &WebResponse::new());
    assert!(rebuilt.principals().is_empty());
    assert!(!rebuilt.authenticated());
}

#[test]
fn empty_principals_remove_the_attribute_from_an_existing_session() {
    let m = manager();
    let seed_req = WebRequest::new();
    let mut seed_resp = WebResponse::new();
    let mut ctx = SecurityContext::new(principals(&["erin"]), false, None, None).unwrap();
    m.bind_context(&mut ctx, &seed_req, &mut seed_resp).unwrap();
    let session = ctx.session().unwrap().clone();

    // Rebind with cleared identity: attribute removed, session untouched otherwise.
    session.set_attribute("unrelated", serde_json::Value::from(1));
    ctx.logout();
    m.bind_context(&mut ctx, &seed_req, &mut seed_resp).unwrap();
    assert_eq!(session.get_attribute(PRINCIPALS_SESSION_KEY), None);
    assert_eq!(session.get_attribute("unrelated"), Some(serde_json::Value::from(1)));
}

#[test]
fn bind_finds_the_request_session_when_the_context_lost_its_handle() {
    let m = manager();
    let seed_req = WebRequest::new();
    let mut seed_resp = WebResponse::new();
    let mut seeded = SecurityContext::new(principals(&["frank"]), false, None, None).unwrap();
    m.bind_context(&mut seeded, &seed_req, &mut seed_resp).unwrap();
    let session = seeded.session().unwrap().clone();

    // A context built without a session reference still must not leave stale
    // identity behind on the exchange's existing session.
    let request = echo_cookies(&seed_resp);
    let mut response = WebResponse::new();
    let mut bare = SecurityContext::anonymous(None, None);
    m.bind_context(&mut bare, &request, &mut response).unwrap();
    assert_eq!(session.get_attribute(PRINCIPALS_SESSION_KEY), None);
}

#[test]
fn repeated_bind_is_idempotent() {
    let m = manager();
    let request = WebRequest::new();
    let mut response = WebResponse::new();
    let mut ctx = SecurityContext::new(principals(&["gail"]), true, None, None).unwrap();

    m.bind_context(&mut ctx, &request, &mut response).unwrap();
    let session = ctx.session().unwrap().clone();
    m.bind_context(&mut ctx, &request, &mut response).unwrap();

    assert_eq!(session.id(), ctx.session().unwrap().id(), "no second session started");
    let rebuilt = m.build_context(&echo_cookies(&response), &WebResponse::new());
    assert_eq!(rebuilt.principals(), ctx.principals());
}
