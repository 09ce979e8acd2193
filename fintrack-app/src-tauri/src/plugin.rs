//! Tauri plugin exposing the app lock to the webview.
//!
//! The host builds one [`LockStateMachine`] and hands it to [`init`]; the
//! plugin manages it as state, loads it on startup, feeds window focus
//! through the ordered lifecycle queue and registers one command per lock
//! operation.
//!
//! ```rust,ignore
//! let lock = Arc::new(LockStateMachine::from_config(config, gate));
//! tauri::Builder::default()
//!     .plugin(fintrack_app_lib::plugin::init(lock))
//!     .run(tauri::generate_context!())?;
//! ```
//!
//! Plugin commands are denied until permissions exist for them. The host's
//! `build.rs` generates them from [`COMMANDS`], with `fintrack-app` (feature
//! `tauri`) as a build dependency:
//!
//! ```rust,ignore
//! use fintrack_app_lib::plugin::{COMMANDS, PLUGIN_NAME};
//!
//! fn main() {
//!     tauri_build::try_build(tauri_build::Attributes::new().plugin(
//!         PLUGIN_NAME,
//!         tauri_build::InlinedPlugin::new()
//!             .commands(COMMANDS)
//!             .default_permission(tauri_build::DefaultPermissionRule::AllowAllCommands),
//!     ))
//!     .expect("failed to run tauri-build");
//! }
//! ```
//!
//! and grants `"app-lock:default"` in its capability file.

use std::sync::Arc;

use tauri::plugin::{Builder, TauriPlugin};
use tauri::{Manager, Runtime, State, WindowEvent};

use fintrack_crypto::Pin;

use crate::lifecycle::{lifecycle_channel, AppPhase, LifecycleFeed};
use crate::lock::{LockStateMachine, LockStatus};
use crate::scope::UserIdentity;
use crate::security::LockSettingsUpdate;

/// Plugin name; commands are invoked as `plugin:app-lock|<command>`.
pub const PLUGIN_NAME: &str = "app-lock";

/// Commands registered by [`init`], for permission generation.
pub const COMMANDS: &[&str] = &[
    "get_lock_status",
    "is_biometrics_available",
    "set_user",
    "report_app_phase",
    "unlock_with_pin",
    "unlock_with_biometrics",
    "lock_now",
    "enable_lock",
    "disable_lock",
    "update_settings",
    "change_pin",
];

/// Lock engine as held in Tauri state.
pub type SharedLock = Arc<LockStateMachine>;

// Async commands borrowing `State` must return `Result`. Lock operations
// never fail, so the error side is never produced.
type CommandResult<T> = Result<T, String>;

// ============================================================================
// STATUS COMMANDS
// ============================================================================

#[tauri::command]
async fn get_lock_status(lock: State<'_, SharedLock>) -> CommandResult<LockStatus> {
    Ok(lock.status().await)
}

#[tauri::command]
async fn is_biometrics_available(lock: State<'_, SharedLock>) -> CommandResult<bool> {
    Ok(lock.is_biometrics_available().await)
}

/// Signed-in user changed (or signed out when `user` is null).
#[tauri::command]
async fn set_user(
    user: Option<UserIdentity>,
    lock: State<'_, SharedLock>,
) -> CommandResult<LockStatus> {
    lock.switch_user(user.as_ref()).await;
    Ok(lock.status().await)
}

/// Lifecycle report from the frontend (e.g. `visibilitychange`).
#[tauri::command]
async fn report_app_phase(
    phase: AppPhase,
    feed: State<'_, LifecycleFeed>,
    lock: State<'_, SharedLock>,
) -> CommandResult<LockStatus> {
    feed.submit(phase).await;
    Ok(lock.status().await)
}

// ============================================================================
// UNLOCK COMMANDS
// ============================================================================

#[tauri::command]
async fn unlock_with_pin(pin: String, lock: State<'_, SharedLock>) -> CommandResult<bool> {
    let pin = Pin::new(pin);
    Ok(lock.unlock_with_pin(&pin).await)
}

#[tauri::command]
async fn unlock_with_biometrics(lock: State<'_, SharedLock>) -> CommandResult<bool> {
    Ok(lock.unlock_with_biometrics().await)
}

#[tauri::command]
async fn lock_now(lock: State<'_, SharedLock>) -> CommandResult<bool> {
    Ok(lock.lock_now().await)
}

// ============================================================================
// SETTINGS COMMANDS
// ============================================================================

#[tauri::command]
async fn enable_lock(
    pin: String,
    enable_biometrics: Option<bool>,
    lock: State<'_, SharedLock>,
) -> CommandResult<bool> {
    let pin = Pin::new(pin);
    Ok(lock
        .enable_lock(&pin, enable_biometrics.unwrap_or(false))
        .await)
}

#[tauri::command]
async fn disable_lock(lock: State<'_, SharedLock>) -> CommandResult<bool> {
    Ok(lock.disable_lock().await)
}

#[tauri::command]
async fn update_settings(
    update: LockSettingsUpdate,
    lock: State<'_, SharedLock>,
) -> CommandResult<bool> {
    Ok(lock.update_settings(&update).await)
}

#[tauri::command]
async fn change_pin(
    old_pin: String,
    new_pin: String,
    lock: State<'_, SharedLock>,
) -> CommandResult<bool> {
    let (old_pin, new_pin) = (Pin::new(old_pin), Pin::new(new_pin));
    Ok(lock.change_pin(&old_pin, &new_pin).await)
}

// ============================================================================
// PLUGIN
// ============================================================================

/// Build the plugin around `lock`.
pub fn init<R: Runtime>(lock: SharedLock) -> TauriPlugin<R> {
    Builder::new(PLUGIN_NAME)
        .invoke_handler(tauri::generate_handler![
            // Status
            get_lock_status,
            is_biometrics_available,
            set_user,
            report_app_phase,
            // Unlock
            unlock_with_pin,
            unlock_with_biometrics,
            lock_now,
            // Settings
            enable_lock,
            disable_lock,
            update_settings,
            change_pin,
        ])
        .setup(move |app, _api| {
            let (feed, worker) = lifecycle_channel();
            app.manage(lock.clone());
            app.manage(feed);
            tauri::async_runtime::spawn(worker.run(lock.clone()));
            tauri::async_runtime::spawn(async move {
                lock.load().await;
            });
            Ok(())
        })
        .on_window_event(|window, event| {
            if let WindowEvent::Focused(focused) = event {
                if let Some(feed) = window.try_state::<LifecycleFeed>() {
                    if !feed.report_focus(*focused) {
                        tracing::warn!("Lifecycle queue closed, focus change dropped");
                    }
                }
            }
        })
        .build()
}
