// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for captured media
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │  Image File  │
//! │   (RGBA)     │     │  - RGBA→RGB       │     │              │
//! │              │     │  - Encoding       │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: JPEG/PNG encoding and saving of captured frames

pub mod photo;
