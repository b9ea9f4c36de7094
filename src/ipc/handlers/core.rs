use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::{Session, SessionStore};
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "authMode": state.config.auth_mode.to_string(),
            "signedIn": state.session.is_some(),
        }),
    )
}

/// Opens the workspace database and restores any stored session. A stored
/// profile that cannot be read must not prevent the workspace from opening.
pub fn open_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let conn = db::open_db(path)?;
    let store = SessionStore::new(&conn);
    let session = match Session::restore(&store) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable stored session");
            if let Err(e) = store.clear() {
                tracing::warn!(error = %e, "failed to clear unreadable stored session");
            }
            None
        }
    };
    state.session = session;
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    tracing::info!(workspace = %path.display(), "workspace opened");
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(state, &path) {
        Ok(()) => ok(
            &req.id,
            json!({
                "workspacePath": path.to_string_lossy(),
                "profile": state.session.as_ref().map(|s| &s.profile),
            }),
        ),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::session::PROFILE_KEY;

    #[test]
    fn unreadable_stored_session_is_cleared_on_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let conn = db::open_db(dir.path()).expect("open");
            conn.execute(
                "INSERT INTO settings(key, value_json) VALUES(?, 'not json{')",
                [PROFILE_KEY],
            )
            .expect("raw insert");
        }

        let mut state = AppState::new(Config::default());
        open_workspace(&mut state, dir.path()).expect("workspace opens");
        assert!(state.session.is_none());
        let conn = state.db.as_ref().expect("db");
        assert_eq!(db::settings_get_text(conn, PROFILE_KEY).expect("get"), None);
    }
}
