//! # steamtool
//!
//! A console toolkit for fetching Steam depot manifests and installing
//! their decryption keys into a local Steam client.
//!
//! ## Features
//!
//! - **Manifest Downloader**: Fetches manifest bundles from mirrored
//!   GitHub repositories (with CDN fallback rotation) or a cookie-gated
//!   manifest API, and accepts locally dropped zip bundles
//! - **Key Installation**: Extracts depot decryption keys from Lua unlock
//!   scripts or `key.vdf` files and patches them into `config.vdf`
//! - **AppID Lists**: Plain-text id lists with add/show/remove, plus
//!   grouping by resolved game name
//! - **Launch Pipeline**: Regenerates the injector AppList and starts the
//!   injector against the Steam client
//! - **Console Menu**: Interactive shell mirroring the subcommands
//!
//! ## Modules
//!
//! - [`applist`] - AppID list files and AppList generation
//! - [`appinfo`] - Game name / install dir lookups via the appinfo API
//! - [`config`] - Tool configuration (`steamtool.toml`)
//! - [`ctx`] - Application context and state management
//! - [`download`] - Manifest acquisition (GitHub, CDN, API, local zips)
//! - [`menu`] - Interactive console menu
//! - [`steam`] - Steam installation surfaces: registry, config.vdf, injector

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

/// Game metadata lookups via the appinfo web API.
pub mod appinfo;

/// AppID list management and injector AppList generation.
pub mod applist;

/// Tool configuration loaded from `steamtool.toml`.
pub mod config;

/// Application context and state management.
pub mod ctx;

/// Manifest acquisition: GitHub mirrors, CDN rotation, manifest API,
/// local zip intake.
pub mod download;

/// Interactive console menu shell.
pub mod menu;

/// Steam installation surfaces.
///
/// Registry lookup of the install path, `config.vdf` backup and patching,
/// depotcache population, appmanifest generation, injector launching and
/// app-cache clearing.
pub mod steam;
