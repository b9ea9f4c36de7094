use crate::error::SessionError;
use crate::ipc::error::{err, respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use crate::session::{authenticator_for, Credentials, Role, Session, SessionStore};
use rusqlite::Connection;
use serde_json::json;

fn db_conn<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn session_login(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let email = get_required_str(params, "email")?;
    let password = get_required_str(params, "password")?;
    let role = get_required_str(params, "role")?
        .parse::<Role>()
        .map_err(|_| HandlerErr::bad_params("role must be teacher or student"))?;
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr {
            code: "no_workspace",
            message: "select a workspace first".to_string(),
            details: None,
        });
    };

    let authenticator = authenticator_for(state.config.auth_mode);
    let credentials = Credentials {
        email,
        password,
        role,
    };
    let session = Session::login(&SessionStore::new(conn), authenticator.as_ref(), &credentials)
        .map_err(|e| {
            tracing::warn!(error = %e, role = %role, "login failed");
            e
        })?;
    let result = json!({
        "sessionId": session.id,
        "signedInAt": session.signed_in_at,
        "profile": session.profile,
    });
    state.session = Some(session);
    Ok(result)
}

fn handle_session_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, session_login(state, &req.params))
}

fn handle_session_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = db_conn(state, req) {
        return resp;
    }
    respond(
        &req.id,
        Ok(json!({ "profile": state.session.as_ref().map(|s| &s.profile) })),
    )
}

fn handle_session_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(session) = state.session.as_ref() else {
        return respond(&req.id, Err(SessionError::NotSignedIn.into()));
    };
    if let Err(e) = session.logout(&SessionStore::new(conn)) {
        tracing::error!(error = %e, "failed to clear stored session");
        let code = match &e {
            SessionError::Store(_) => "db_update_failed",
            other => other.code(),
        };
        return err(&req.id, code, e.to_string(), None);
    }
    state.session = None;
    respond(&req.id, Ok(json!({ "signedOut": true })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_session_login(state, req)),
        "session.current" => Some(handle_session_current(state, req)),
        "session.logout" => Some(handle_session_logout(state, req)),
        _ => None,
    }
}
