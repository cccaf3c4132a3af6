//! # qirust-live
//!
//! A live QR code preview pipeline.
//!
//! `qirust-live` takes the raw values of a small form (message text, optional
//! auxiliary text, error correction level, pixel scale and margin), encodes the
//! message and renders a scannable raster together with display metadata. Every
//! edit re-runs the whole pipeline and fully replaces the previous output.
//!
//! ## Features
//!
//! - Normalize raw form input: trim the message, map `L`/`M`/`Q`/`H`, clamp
//!   scale to 2–20 and margin to 0–10.
//! - Render each module as an exact `scale × scale` block, with no blending.
//! - Report version, size, mask and the effective error correction level,
//!   optionally with a generation timestamp.
//! - Export renders as PNG files, PNG data URIs, SVG or terminal text.
//! - Inject output sinks, so the pipeline runs without a real display.
//!
//! ## Example
//!
//! Drive the preview from form events:
//!
//! ```rust
//! use qirust_live::preview::{
//!     FormEvent, FormField, ImageSurface, LivePreview, MetaPanel, PreviewState, StatusLine,
//! };
//! use qirust_live::PreviewConfig;
//!
//! let mut preview = LivePreview::new(
//!     PreviewConfig::default(),
//!     ImageSurface::default(),
//!     MetaPanel::default(),
//!     StatusLine::default(),
//! );
//!
//! preview.handle(&FormEvent::change(FormField::Scale, "10"));
//! let state = preview.handle(&FormEvent::input(FormField::Text, "HELLO"));
//!
//! assert!(matches!(state, PreviewState::Rendering(_)));
//! assert_eq!(preview.surface().dimensions(), (290, 290));
//! assert_eq!(preview.meta().fields().size, "21 × 21");
//! ```
//!
//! Render a single symbol:
//!
//! ```rust
//! use qirust_live::helper::render;
//! use qirust_live::normalize::RenderOptions;
//! use qirust_live::qrcode::{Encoder, ErrorLevel, QrCodeGenEncoder};
//!
//! let matrix = QrCodeGenEncoder::default()
//!     .encode("Hello, World!", ErrorLevel::Medium, None)
//!     .unwrap();
//! let result = render(&matrix, &RenderOptions::new(ErrorLevel::Medium, 4, 2));
//! assert_eq!(result.image.width(), (matrix.size() as u32 + 4) * 4);
//! ```
//!
//! ## Modules
//!
//! - [`qrcode`]: Symbol matrices and the encoder seam.
//! - [`normalize`]: Raw form values to render options.
//! - [`helper`]: Raster rendering and exports.
//! - [`meta`]: Display metadata and timestamps.
//! - [`preview`]: The event-driven pipeline and its output sinks.

pub mod config;
pub mod error;
pub mod helper;
pub mod meta;
pub mod normalize;
pub mod preview;
pub mod qrcode;

pub use config::PreviewConfig;
pub use error::{EncodeError, Error, Result};
pub use helper::{render, RenderResult, Renderer};
pub use meta::DisplayMeta;
pub use normalize::{normalize, NormalizedInput, RenderOptions};
pub use preview::{LivePreview, PreviewState};
pub use qrcode::{Encoder, ErrorLevel, QrCodeGenEncoder, SymbolMatrix};
