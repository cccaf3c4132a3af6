//! The live preview pipeline: form state in, raster / metadata / status out.
//!
//! Every form event runs normalize → encode → render to completion and then
//! overwrites all three outputs. Nothing from a previous run is reused, so a
//! stale raster or metadata value can never survive an edit.

use std::fmt;
use std::str::FromStr;

use image::GrayImage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::PreviewConfig;
use crate::error::{EncodeError, Error, Result};
use crate::helper::{RenderResult, Renderer};
use crate::meta::{DisplayMeta, MetaFields};
use crate::normalize::normalize;
use crate::qrcode::{Encoder, ErrorLevel, QrCodeGenEncoder};

pub const PROMPT: &str = "Enter text to generate a QR code.";

/*---- Output sinks ----*/

/// Where the drawn raster goes.
pub trait RasterSurface {
    /// Replaces whatever is shown with `result.image`, adopting its dimensions.
    fn present(&mut self, result: &RenderResult);
    /// Removes the current raster.
    fn clear(&mut self);
}

/// Where the metadata panel text goes.
pub trait MetaSink {
    fn show(&mut self, fields: &MetaFields);

    fn reset(&mut self) {
        self.show(&MetaFields::placeholder());
    }
}

/// Where the one-line status text goes.
pub trait StatusSink {
    fn set_status(&mut self, status: &str);
}

/// In-memory [`RasterSurface`] holding the last presented render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageSurface {
    current: Option<RenderResult>,
}

impl ImageSurface {
    pub fn current(&self) -> Option<&RenderResult> {
        self.current.as_ref()
    }

    pub fn image(&self) -> Option<&GrayImage> {
        self.current.as_ref().map(|result| &result.image)
    }

    /// `(0, 0)` while cleared.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image().map_or((0, 0), GrayImage::dimensions)
    }
}

impl RasterSurface for ImageSurface {
    fn present(&mut self, result: &RenderResult) {
        self.current = Some(result.clone());
    }

    fn clear(&mut self) {
        self.current = None;
    }
}

/// In-memory [`MetaSink`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaPanel {
    fields: MetaFields,
}

impl MetaPanel {
    pub fn fields(&self) -> &MetaFields {
        &self.fields
    }
}

impl MetaSink for MetaPanel {
    fn show(&mut self, fields: &MetaFields) {
        self.fields = fields.clone();
    }
}

/// In-memory [`StatusSink`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    text: String,
}

impl StatusLine {
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl StatusSink for StatusLine {
    fn set_status(&mut self, status: &str) {
        self.text = status.to_owned();
    }
}

/*---- Form ----*/

/// Raw form values, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    pub text: String,
    pub auxiliary: String,
    pub error_level: String,
    pub scale: String,
    pub margin: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            text: String::new(),
            auxiliary: String::new(),
            error_level: ErrorLevel::Low.code().to_owned(),
            scale: crate::normalize::DEFAULT_SCALE.to_string(),
            margin: crate::normalize::DEFAULT_MARGIN.to_string(),
        }
    }
}

impl FormState {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Text => self.text = value,
            FormField::Auxiliary => self.auxiliary = value,
            FormField::ErrorLevel => self.error_level = value,
            FormField::Scale => self.scale = value,
            FormField::Margin => self.margin = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Text,
    Auxiliary,
    ErrorLevel,
    Scale,
    Margin,
}

impl FromStr for FormField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "text" => Ok(Self::Text),
            "aux" | "auxiliary" => Ok(Self::Auxiliary),
            "ecl" | "level" | "errorLevel" => Ok(Self::ErrorLevel),
            "scale" => Ok(Self::Scale),
            "margin" => Ok(Self::Margin),
            other => Err(Error::UnknownField(other.to_owned())),
        }
    }
}

/// The DOM event kinds the form reacts to. All of them re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormEventKind {
    Input,
    Change,
    Submit,
}

/// One edit to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormEvent {
    pub kind: FormEventKind,
    pub field: FormField,
    pub value: String,
}

impl FormEvent {
    pub fn input(field: FormField, value: impl Into<String>) -> Self {
        Self {
            kind: FormEventKind::Input,
            field,
            value: value.into(),
        }
    }

    pub fn change(field: FormField, value: impl Into<String>) -> Self {
        Self {
            kind: FormEventKind::Change,
            field,
            value: value.into(),
        }
    }

    /// Enter pressed in `field` while it holds `value`.
    pub fn submit(field: FormField, value: impl Into<String>) -> Self {
        Self {
            kind: FormEventKind::Submit,
            field,
            value: value.into(),
        }
    }

    /// Parses a `field=value` edit line. The value keeps its whitespace.
    pub fn parse_edit(line: &str) -> Result<Self> {
        let (field, value) = line
            .split_once('=')
            .ok_or_else(|| Error::MalformedEdit(line.to_owned()))?;
        Ok(Self::input(field.parse()?, value))
    }
}

/*---- Pipeline ----*/

/// What the outputs show after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewState {
    /// No message; outputs cleared and the prompt shown.
    Idle,
    /// Symbol drawn and described.
    Rendering(DisplayMeta),
    /// The encoder rejected the input; `reason` is its message verbatim.
    EncodeFailed { reason: String },
}

impl fmt::Display for PreviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Rendering(meta) => write!(f, "rendering version {}", meta.version),
            Self::EncodeFailed { reason } => write!(f, "encode failed: {reason}"),
        }
    }
}

/// Drives the outputs from form state.
///
/// Holds the form, the encoder and the three output sinks. Runs are strictly
/// sequential because every entry point takes `&mut self`.
pub struct LivePreview<E, R, M, S> {
    form: FormState,
    config: PreviewConfig,
    encoder: E,
    renderer: Renderer,
    surface: R,
    meta: M,
    status: S,
}

impl<R, M, S> LivePreview<QrCodeGenEncoder, R, M, S>
where
    R: RasterSurface,
    M: MetaSink,
    S: StatusSink,
{
    /// A preview using the `qrcodegen` engine configured from `config`.
    pub fn new(config: PreviewConfig, surface: R, meta: M, status: S) -> Self {
        let encoder = QrCodeGenEncoder::new(config.boost_error_correction);
        Self::with_encoder(config, encoder, surface, meta, status)
    }
}

impl<E, R, M, S> LivePreview<E, R, M, S>
where
    E: Encoder,
    R: RasterSurface,
    M: MetaSink,
    S: StatusSink,
{
    pub fn with_encoder(config: PreviewConfig, encoder: E, surface: R, meta: M, status: S) -> Self {
        Self {
            form: FormState::default(),
            renderer: Renderer::new(config.palette(), config.timestamp),
            config,
            encoder,
            surface,
            meta,
            status,
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn meta(&self) -> &M {
        &self.meta
    }

    pub fn status(&self) -> &S {
        &self.status
    }

    /// Applies `event` to the form and re-renders.
    pub fn handle(&mut self, event: &FormEvent) -> PreviewState {
        debug!("{:?} on {:?}", event.kind, event.field);
        self.form.set(event.field, event.value.clone());
        self.run()
    }

    /// Replaces the whole form and re-renders.
    pub fn load(&mut self, form: FormState) -> PreviewState {
        self.form = form;
        self.run()
    }

    /// Re-renders from the current form.
    pub fn run(&mut self) -> PreviewState {
        let state = match self.try_render() {
            None => {
                self.clear_outputs();
                self.status.set_status(PROMPT);
                PreviewState::Idle
            }
            Some(Ok(result)) => {
                self.surface.present(&result);
                self.meta.show(&result.meta.fields());
                self.status.set_status(&format!(
                    "QR code generated with {} error correction.",
                    result.options.error_level.label()
                ));
                PreviewState::Rendering(result.meta)
            }
            Some(Err(err)) => {
                warn!("unable to generate QR code: {err}");
                self.clear_outputs();
                self.status
                    .set_status(&format!("Unable to generate QR code: {}", err.message()));
                PreviewState::EncodeFailed {
                    reason: err.message().to_owned(),
                }
            }
        };
        info!("preview {state}");
        state
    }

    fn try_render(&self) -> Option<std::result::Result<RenderResult, EncodeError>> {
        let auxiliary = self
            .config
            .auxiliary
            .then_some(self.form.auxiliary.as_str());
        let input = normalize(
            &self.form.text,
            auxiliary,
            &self.form.error_level,
            &self.form.scale,
            &self.form.margin,
        )?;
        let auxiliary = self.config.auxiliary.then_some(input.auxiliary.as_str());
        Some(
            self.encoder
                .encode(&input.message, input.options.error_level, auxiliary)
                .map(|matrix| self.renderer.render(&matrix, &input.options)),
        )
    }

    fn clear_outputs(&mut self) {
        self.surface.clear();
        self.meta.reset();
    }
}
