//! Shared non-UI layer for traxdl: the yt-dlp adapter, link parsing,
//! configuration, display formatting, and external tool discovery.

pub mod config;
pub mod format;
pub mod links;
pub mod platform;
pub mod provider;
