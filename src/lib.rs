//! CapMeet - Record your screen and meetings, upload them anywhere.
//!
//! This is the main library crate for the CapMeet application.
//! It provides the Tauri application setup and all backend functionality.

pub mod capture;
pub mod commands;
pub mod recorder;
pub mod store;
pub mod upload;
pub mod utils;

use commands::auth::StoreState;
use commands::recording::RecorderState;
use commands::upload::UploadState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the application
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "capmeet=debug,tauri=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CapMeet v{}", env!("CARGO_PKG_VERSION"));

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .manage(RecorderState::default())
        .manage(UploadState::default())
        .manage(StoreState::default())
        .invoke_handler(tauri::generate_handler![
            // Recording commands
            commands::recording::get_capture_sources,
            commands::recording::get_displays,
            commands::recording::get_audio_devices,
            commands::recording::check_microphone_permission,
            commands::recording::request_microphone_permission,
            commands::recording::check_screen_permission,
            commands::recording::request_screen_permission,
            commands::recording::check_system_audio_available,
            commands::recording::open_permission_settings,
            commands::recording::start_recording,
            commands::recording::stop_recording,
            commands::recording::get_recording_state,
            commands::recording::get_recording_duration,
            commands::recording::toggle_microphone_mute,
            commands::recording::get_microphone_mute,
            // Upload commands
            commands::upload::upload_recording,
            commands::upload::is_uploading,
            commands::upload::get_latest_recording_status,
            commands::upload::list_failed_uploads,
            commands::upload::clear_upload_history,
            // Auth commands
            commands::auth::set_auth_token,
            commands::auth::get_auth_token,
            commands::auth::clear_auth_token,
            commands::auth::is_authenticated,
            // Settings commands
            commands::settings::get_preferences,
            commands::settings::set_preferences,
        ])
        .setup(|app| {
            // Set up transparent background for the overlay window on macOS
            #[cfg(target_os = "macos")]
            {
                #[allow(deprecated)]
                {
                    use cocoa::appkit::NSWindow;
                    use cocoa::base::id;
                    use tauri::Manager;

                    if let Some(window) = app.get_webview_window("overlay") {
                        if let Ok(ns_window) = window.ns_window() {
                            unsafe {
                                let ns_window = ns_window as id;
                                // Overlay floats over everything with no chrome
                                ns_window.setOpaque_(cocoa::base::NO);
                                ns_window.setHasShadow_(cocoa::base::NO);
                            }
                        }
                    }
                }
            }

            #[cfg(not(target_os = "macos"))]
            {
                let _ = app;
            }

            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
