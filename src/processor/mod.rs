//! Processors: named units of work applied to a container.
//!
//! A [`Processor`] wraps one [`Effect`]: it reads the container's current
//! image, applies the effect and installs the result as the new working image.
//! A [`ProcessorChain`] runs processors strictly in order and stops at the
//! first error.
//!
//! Processors come from three places:
//!
//! - [`builtin`]: fixed presets addressed by well-known ids;
//! - [`ConfigurableProcessor`]: one stored [`ProcessorConfig`];
//! - [`ConfigurableCompositeProcessor`]: a stored [`CompositeProcessorConfig`].
//!
//! [`resolve`] turns an id into a processor, trying them in that order.

pub mod builtin;

use crate::container::ImageContainer;
use crate::effects::watermark::CornerText;
use crate::effects::{
    BackgroundBlurEffect, BorderEffect, Effect, EffectError, RatioPadEffect, RoundedCornerEffect,
    SquareEffect, WatermarkEffect, WatermarkStyle,
};
use crate::imaging::parse_color;
use crate::processor_config::{
    CompositeProcessorConfig, ProcessorConfig, ProcessorConfigError, ProcessorParams,
    TransformKind, WatermarkParams,
};
use crate::resources::RenderContext;
use crate::store::{ConfigStore, StoreError, StoredConfig};
use std::sync::Arc;

/// Something that transforms a container in place.
///
/// `Send + Sync` so one chain can be shared by every batch worker.
pub trait Process: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn process(&self, container: &mut ImageContainer) -> Result<(), EffectError>;
}

/// One effect under an id and a display name.
pub struct Processor {
    id: String,
    name: String,
    effect: Box<dyn Effect>,
}

impl Processor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        effect: impl Effect + 'static,
    ) -> Self {
        Self::boxed(id, name, Box::new(effect))
    }

    pub fn boxed(id: impl Into<String>, name: impl Into<String>, effect: Box<dyn Effect>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            effect,
        }
    }
}

impl Process for Processor {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, container: &mut ImageContainer) -> Result<(), EffectError> {
        log::debug!(
            "{}: applying {} to {}",
            self.id,
            self.effect.name(),
            container.path().display()
        );
        let view: &ImageContainer = container;
        let output = self.effect.apply(view.current(), Some(view))?;
        container.update_working(output);
        Ok(())
    }
}

/// Ordered list of processors.
#[derive(Default)]
pub struct ProcessorChain {
    processors: Vec<Box<dyn Process>>,
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, processor: Box<dyn Process>) {
        self.processors.push(processor);
    }

    /// Insert at `index`, clamped to the end of the chain.
    pub fn insert(&mut self, index: usize, processor: Box<dyn Process>) {
        let index = index.min(self.processors.len());
        self.processors.insert(index, processor);
    }

    /// Remove the first processor with `id`.
    pub fn remove(&mut self, id: &str) -> Option<Box<dyn Process>> {
        let index = self.processors.iter().position(|p| p.id() == id)?;
        Some(self.processors.remove(index))
    }

    pub fn clear(&mut self) {
        self.processors.clear();
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.id()).collect()
    }

    /// Run every processor in order. The first error is returned as is and
    /// the remaining processors are skipped.
    pub fn process(&self, container: &mut ImageContainer) -> Result<(), EffectError> {
        for processor in &self.processors {
            processor.process(container)?;
        }
        Ok(())
    }
}

// =============================================================================
// Configurable processors
// =============================================================================

/// The effect described by a stored config.
fn build_effect(
    params: &ProcessorParams,
    context: &Arc<RenderContext>,
) -> Result<Box<dyn Effect>, EffectError> {
    let effect: Box<dyn Effect> = match params {
        ProcessorParams::Border(p) => Box::new(BorderEffect::new(
            Some(p.border_size),
            &p.border_color,
            p.sides,
        )?),
        ProcessorParams::Blur(p) => Box::new(BackgroundBlurEffect::new(
            p.blur_radius,
            p.padding_percent,
            p.blend_alpha,
        )?),
        ProcessorParams::Transform(p) => match p.transform_type {
            TransformKind::Square => Box::new(SquareEffect::default()),
            TransformKind::Ratio => {
                Box::new(RatioPadEffect::new(Some(p.target_ratio.unwrap_or(1.0)))?)
            }
            TransformKind::Rounded => Box::new(RoundedCornerEffect::new(p.radius)),
        },
        ProcessorParams::Watermark(p) => Box::new(WatermarkEffect::new(
            watermark_style(p, context)?,
            Some(Arc::clone(context)),
        )),
    };
    Ok(effect)
}

/// Stored palette over the configured corner contents.
fn watermark_style(
    params: &WatermarkParams,
    context: &RenderContext,
) -> Result<WatermarkStyle, EffectError> {
    let mut style = WatermarkStyle::from_config(&context.config.watermark)?;
    style.logo_position = params.logo_position;
    style.logo_enabled = params.logo_enabled;
    style.logo_name = match params.logo_name.as_str() {
        "" | "auto" => None,
        name => Some(name.to_string()),
    };
    style.background_color = parse_color(&params.background_color)?;

    let corners: [(&mut CornerText, _); 4] = [
        (&mut style.left_top, &params.left_top),
        (&mut style.left_bottom, &params.left_bottom),
        (&mut style.right_top, &params.right_top),
        (&mut style.right_bottom, &params.right_bottom),
    ];
    for (corner, stored) in corners {
        corner.color = parse_color(&stored.color)?;
        corner.bold = stored.bold;
    }
    Ok(style)
}

/// A processor built from one [`ProcessorConfig`].
pub struct ConfigurableProcessor {
    config: ProcessorConfig,
    inner: Processor,
}

impl ConfigurableProcessor {
    /// Invalid parameters (bad colours, out-of-range values) fail here rather
    /// than mid-batch.
    pub fn new(config: ProcessorConfig, context: Arc<RenderContext>) -> Result<Self, EffectError> {
        let effect = build_effect(&config.params, &context)?;
        let inner = Processor::boxed(config.id.clone(), config.name.clone(), effect);
        Ok(Self { config, inner })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }
}

impl Process for ConfigurableProcessor {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn process(&self, container: &mut ImageContainer) -> Result<(), EffectError> {
        self.inner.process(container)
    }
}

/// An ordered group of processors built from a [`CompositeProcessorConfig`].
pub struct ConfigurableCompositeProcessor {
    id: String,
    name: String,
    context: Arc<RenderContext>,
    processors: Vec<Box<dyn Process>>,
}

impl ConfigurableCompositeProcessor {
    /// Members follow `processor_ids`: an id with a matching entry in
    /// `processor_configs` uses it, any other id must be a built-in. A
    /// composite without ids uses its configs in stored order.
    pub fn new(
        composite: &CompositeProcessorConfig,
        context: Arc<RenderContext>,
    ) -> Result<Self, ProcessorConfigError> {
        let invalid =
            |id: &str, e: EffectError| ProcessorConfigError::Invalid(format!("{id}: {e}"));

        let mut processors: Vec<Box<dyn Process>> = Vec::new();
        if composite.processor_ids.is_empty() {
            for config in &composite.processor_configs {
                let id = config.id.clone();
                let processor = ConfigurableProcessor::new(config.clone(), Arc::clone(&context))
                    .map_err(|e| invalid(&id, e))?;
                processors.push(Box::new(processor));
            }
        }
        for id in &composite.processor_ids {
            let processor: Box<dyn Process> = match composite.config_for(id) {
                Some(config) => Box::new(
                    ConfigurableProcessor::new(config.clone(), Arc::clone(&context))
                        .map_err(|e| invalid(id, e))?,
                ),
                None => Box::new(
                    builtin::resolve(id, &context)
                        .map_err(|e| invalid(id, e))?
                        .ok_or_else(|| ProcessorConfigError::UnknownProcessor(id.clone()))?,
                ),
            };
            processors.push(processor);
        }

        Ok(Self {
            id: composite.id.clone(),
            name: composite.name.clone(),
            context,
            processors,
        })
    }

    pub fn add(&mut self, config: ProcessorConfig) -> Result<(), EffectError> {
        let processor = ConfigurableProcessor::new(config, Arc::clone(&self.context))?;
        self.processors.push(Box::new(processor));
        Ok(())
    }

    /// Remove the first member with `id`; returns whether one was found.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.processors.iter().position(|p| p.id() == id) {
            Some(index) => {
                self.processors.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.processors.clear();
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// `"1. {name} ({id})"` per member.
    pub fn descriptions(&self) -> Vec<String> {
        self.processors
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {} ({})", i + 1, p.name(), p.id()))
            .collect()
    }
}

impl Process for ConfigurableCompositeProcessor {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, container: &mut ImageContainer) -> Result<(), EffectError> {
        for processor in &self.processors {
            processor.process(container)?;
        }
        Ok(())
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Find the processor for `id`: a built-in, then a stored config, then a
/// stored composite.
pub fn resolve(
    id: &str,
    context: &Arc<RenderContext>,
    store: Option<&ConfigStore>,
) -> Result<Box<dyn Process>, StoreError> {
    let invalid = |e: EffectError| ProcessorConfigError::Invalid(format!("{id}: {e}"));

    if let Some(processor) = builtin::resolve(id, context).map_err(invalid)? {
        return Ok(Box::new(processor));
    }

    let unknown = || StoreError::Config(ProcessorConfigError::UnknownProcessor(id.to_string()));
    let Some(store) = store else {
        return Err(unknown());
    };
    match store.load(id) {
        Ok(StoredConfig::Single(config)) => Ok(Box::new(
            ConfigurableProcessor::new(config, Arc::clone(context)).map_err(invalid)?,
        )),
        Ok(StoredConfig::Composite(composite)) => Ok(Box::new(ConfigurableCompositeProcessor::new(
            &composite,
            Arc::clone(context),
        )?)),
        Err(StoreError::NotFound(_)) => Err(unknown()),
        Err(e) => Err(e),
    }
}

/// A composite of `ids`, in order, ready to store.
///
/// Built-in ids are kept by reference. Stored configs are copied into the
/// composite, so it keeps working if the originals are edited or deleted.
/// Composites do not nest.
pub fn compose(
    store: &ConfigStore,
    name: Option<&str>,
    ids: &[String],
) -> Result<CompositeProcessorConfig, StoreError> {
    if ids.is_empty() {
        return Err(ProcessorConfigError::Invalid(
            "a composite needs at least one processor".into(),
        )
        .into());
    }

    let mut configs: Vec<ProcessorConfig> = Vec::new();
    for id in ids {
        if builtin::is_builtin(id) || configs.iter().any(|c| &c.id == id) {
            continue;
        }
        match store.load(id) {
            Ok(StoredConfig::Single(config)) => configs.push(config),
            Ok(StoredConfig::Composite(_)) => {
                return Err(ProcessorConfigError::Invalid(format!(
                    "'{id}' is a composite and cannot be nested"
                ))
                .into());
            }
            Err(StoreError::NotFound(_)) => {
                return Err(ProcessorConfigError::UnknownProcessor(id.clone()).into());
            }
            Err(e) => return Err(e),
        }
    }

    let mut composite = CompositeProcessorConfig::from_configs(name, configs);
    composite.processor_ids = ids.to_vec();
    Ok(composite)
}

/// Resolve every id into one chain, in order.
pub fn build_chain(
    ids: &[String],
    context: &Arc<RenderContext>,
    store: Option<&ConfigStore>,
) -> Result<ProcessorChain, StoreError> {
    let mut chain = ProcessorChain::new();
    for id in ids {
        chain.push(resolve(id, context, store)?);
    }
    Ok(chain)
}
