// ─── MistXI Core ───
// Runtime acquisition and environment provisioning for the MistXI launcher.
//
// Architecture:
//   core/
//     github/     Release/commit lookups (version resolution)
//     downloader/ Streamed, size-guarded, atomically committed downloads
//     archive/    Zip extraction + tree swap with preserved user paths
//     runtime/    Ashita install, curated/blocked extensions, version marker
//     loader/     XiLoader release selection and install
//     boot/       Boot INI rendering
//     addons/     Startup script rendering + installed extension catalog
//     provision/  Launch preparation facade
//     profile/    Game profiles
//     state/      Persisted launcher state + on-disk layout
//     web/        Server status and news
//     launch/     Launch plan handed to the process launcher

pub mod addons;
pub mod archive;
pub mod boot;
pub mod downloader;
pub mod error;
pub mod fsutil;
pub mod github;
pub mod http;
pub mod launch;
pub mod loader;
pub mod outcome;
pub mod profile;
pub mod progress;
pub mod provision;
pub mod runtime;
pub mod state;
pub mod web;
