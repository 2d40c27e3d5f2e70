//! Benchmark execution engine
//!
//! Runs every configured model through `warm_up + num_runs` iterations, one
//! at a time. Each iteration loads and preprocesses its input, then times
//! the configured [`crate::types::TimedRegion`]: the predictor call alone by default, or
//! host preprocessing plus the predictor call. Decoding and plan compilation
//! stay outside the clock. Input failures cost one iteration and are
//! reported on stderr; model and runtime failures end the benchmark.

use crate::{
    classify::Synset,
    error::{AppError, ErrorReporter, Result},
    logging::{Logger, LoggerFactory, PerformanceLogger},
    models::{BenchmarkReport, ClassificationResult, RunConfig, SampleLabel, VariantReport},
    predictor::{DataDesc, OnnxPredictor, OutputTensor, Predictor, TensorScope},
    preprocess::{create_preprocessor, generate_batches, load_image, PreprocessConfig, Preprocessor},
    stats::StatisticsCollector,
    types::{Device, ElementType, ModelVariant, PreprocessKind, RunKind, TensorLayout},
};
use chrono::Utc;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Builds the predictor of one model
pub trait PredictorFactory {
    fn create(&self, prefix: &str, descriptors: Vec<DataDesc>, device: Device) -> Result<Box<dyn Predictor>>;
}

impl<F> PredictorFactory for F
where
    F: Fn(&str, Vec<DataDesc>, Device) -> Result<Box<dyn Predictor>>,
{
    fn create(&self, prefix: &str, descriptors: Vec<DataDesc>, device: Device) -> Result<Box<dyn Predictor>> {
        self(prefix, descriptors, device)
    }
}

/// Loads ONNX models through tract
#[derive(Debug, Default, Clone, Copy)]
pub struct OnnxPredictorFactory;

impl PredictorFactory for OnnxPredictorFactory {
    fn create(&self, prefix: &str, descriptors: Vec<DataDesc>, device: Device) -> Result<Box<dyn Predictor>> {
        Ok(Box::new(OnnxPredictor::new(prefix, descriptors, device)?))
    }
}

/// What one successful iteration produced
struct IterationOutcome {
    duration: Duration,
    /// Images fed to the predictor
    images: u64,
    /// Predictor calls made
    batches: u64,
    classifications: Vec<ClassificationResult>,
    top_classes: Vec<ClassificationResult>,
}

/// Everything one model needs during its iterations
struct VariantContext<'a> {
    variant: ModelVariant,
    descriptor: DataDesc,
    predictor: Box<dyn Predictor>,
    preprocessor: Box<dyn Preprocessor>,
    synset: Option<Synset>,
    correlation_id: &'a str,
}

/// Runs the configured benchmark and assembles the report
pub struct BenchmarkRunner {
    config: RunConfig,
    factory: Box<dyn PredictorFactory>,
    logger: Logger,
    perf: PerformanceLogger,
    reporter: ErrorReporter,
}

impl BenchmarkRunner {
    pub fn new(config: RunConfig) -> Self {
        Self::with_factory(config, OnnxPredictorFactory)
    }

    pub fn with_factory<F>(config: RunConfig, factory: F) -> Self
    where
        F: PredictorFactory + 'static,
    {
        let loggers = LoggerFactory::new(config.clone());
        Self {
            logger: loggers.create_logger("BENCH"),
            perf: loggers.create_performance_logger(),
            reporter: ErrorReporter::new(config.enable_color, config.verbose),
            factory: Box::new(factory),
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Benchmark every configured model, end-to-end first
    pub fn run(&self) -> Result<BenchmarkReport> {
        let requested = self.config.device();
        let mut report = BenchmarkReport::new(requested, requested);

        for (variant, prefix) in self.config.variants() {
            let (variant_report, effective) = self.run_variant(variant, prefix)?;
            report.effective_device = effective;
            report.variants.push(variant_report);
        }

        report.generated_at = Utc::now();
        Ok(report)
    }

    /// Input descriptor a model of `variant` is constructed with
    pub fn input_descriptor(&self, variant: ModelVariant) -> DataDesc {
        let batch = match self.config.run_kind() {
            RunKind::Single => 1,
            RunKind::Batch => self.config.batch_size as usize,
        };
        let (h, w) = (self.config.input_height as usize, self.config.input_width as usize);

        match self.config.preprocess_for(variant) {
            PreprocessKind::Identity => {
                DataDesc::new("data", vec![batch, h, w, 3], ElementType::U8, TensorLayout::Nhwc)
            }
            PreprocessKind::ResizeNormalize | PreprocessKind::BatchedResizeNormalize => {
                let shape = match self.config.layout {
                    TensorLayout::Nchw => vec![batch, 3, h, w],
                    TensorLayout::Nhwc => vec![batch, h, w, 3],
                };
                DataDesc::new("data", shape, ElementType::F32, self.config.layout)
            }
        }
    }

    /// Benchmark one model; returns its report and the device it ran on
    pub fn run_variant(&self, variant: ModelVariant, prefix: &str) -> Result<(VariantReport, Device)> {
        let kind = self.config.run_kind();
        let preprocess = self.config.preprocess_for(variant);
        let correlation_id = self.logger.start_operation(&format!("{} {}", variant, kind.metrics_prefix()));

        let descriptor = self.input_descriptor(variant);
        let mut timer = PerformanceLogger::from_logger(self.perf.logger().clone());
        timer.start_timing("model load");
        let predictor = self
            .factory
            .create(prefix, vec![descriptor.clone()], self.config.device());
        let model_load = timer.end_timing("model load");
        let predictor = predictor?;

        let effective = predictor.device();
        if effective != predictor.requested_device() {
            self.logger
                .warn(&format!(
                    "{} requested but the runtime executes on {}; continuing on {}",
                    predictor.requested_device(),
                    effective,
                    effective
                ))
                .correlation_id(&correlation_id)
                .log();
        }
        self.logger
            .info(&format!("Loaded model {}", predictor.model_path().display()))
            .correlation_id(&correlation_id)
            .field("variant", variant)
            .field("preprocess", preprocess)
            .field("device", effective)
            .log();

        let synset = match Synset::for_prefix(prefix) {
            Ok(synset) => {
                crate::log_info!(self.logger, "Loaded {} labels from {}", synset.len(), synset.path().display());
                Some(synset)
            }
            Err(e) => {
                self.reporter.report_error(&e);
                None
            }
        };

        let mut ctx = VariantContext {
            variant,
            descriptor,
            predictor,
            preprocessor: create_preprocessor(preprocess, PreprocessConfig::from(&self.config)),
            synset,
            correlation_id: &correlation_id,
        };

        let mut report = VariantReport::new(
            variant,
            kind,
            prefix,
            preprocess,
            self.config.trim,
            match kind {
                RunKind::Single => 1,
                RunKind::Batch => self.config.batch_size,
            },
        );
        report.timed_region = self.config.timed_region;
        report.model_load_ms = model_load.map(|d| d.as_secs_f64() * 1000.0);
        let mut collector = StatisticsCollector::new(SampleLabel::new(kind, variant), self.config.warm_up, self.config.trim);

        let batches = match kind {
            RunKind::Single => Vec::new(),
            RunKind::Batch => {
                let batches = generate_batches(&self.config.input_dir, self.config.batch_size as usize)?;
                if batches.is_empty() {
                    self.logger
                        .warn(&format!("No images found in {}", self.config.input_dir))
                        .correlation_id(&correlation_id)
                        .log();
                }
                crate::log_debug!(
                    self.logger,
                    "{} batch(es) of up to {} image(s) from {}",
                    batches.len(),
                    self.config.batch_size,
                    self.config.input_dir
                );
                batches
            }
        };

        for run in 0..self.config.total_iterations()? {
            let outcome = match kind {
                RunKind::Single => self.single_iteration(&mut ctx, run),
                RunKind::Batch => self.batch_iteration(&mut ctx, run, &batches),
            };

            match outcome {
                Ok(Some(outcome)) => {
                    let sample = collector.record(run, outcome.duration);
                    self.perf.log_sample(sample, &correlation_id);
                    if !sample.warm_up {
                        report.images_processed += outcome.images;
                        report.batches_processed += outcome.batches;
                        if !outcome.classifications.is_empty() {
                            report.classifications = outcome.classifications;
                        }
                        if !outcome.top_classes.is_empty() {
                            report.top_classes = outcome.top_classes;
                        }
                    }
                }
                Ok(None) => report.failed_runs += 1,
                Err(e) if e.is_recoverable() => {
                    self.reporter.report_error(&e);
                    self.logger
                        .error(&format!("Run {} of {} skipped", run, variant))
                        .correlation_id(&correlation_id)
                        .error_info(&e)
                        .log();
                    report.failed_runs += 1;
                }
                Err(e) => {
                    self.logger.end_operation(&correlation_id, &variant.to_string(), false);
                    return Err(e);
                }
            }
        }

        report.statistics = collector.summarize().ok();
        report.samples = collector.into_samples();
        report.completed_at = Some(Utc::now());

        self.perf.log_variant_summary(&report, &correlation_id);
        self.logger.end_operation(&correlation_id, &variant.to_string(), true);
        Ok((report, effective))
    }

    fn single_iteration(&self, ctx: &mut VariantContext<'_>, run: u32) -> Result<Option<IterationOutcome>> {
        let image = load_image(&self.config.input_image)?;
        let (duration, scores) = match self.timed_predict(ctx, run, &[image])? {
            Some(result) => result,
            None => return Ok(None),
        };

        let (classifications, top_classes) = self.classify(ctx, &scores);
        Ok(Some(IterationOutcome {
            duration,
            images: 1,
            batches: 1,
            classifications,
            top_classes,
        }))
    }

    /// One pass over every batch of the input directory; the sample is the
    /// mean latency of the batches that ran.
    fn batch_iteration(
        &self,
        ctx: &mut VariantContext<'_>,
        run: u32,
        batches: &[Vec<PathBuf>],
    ) -> Result<Option<IterationOutcome>> {
        let mut durations = Vec::with_capacity(batches.len());
        let mut images_fed = 0u64;
        let mut last_scores = Vec::new();

        for (index, batch) in batches.iter().enumerate() {
            let images = match batch.iter().map(load_image).collect::<Result<Vec<_>>>() {
                Ok(images) => images,
                Err(e) if e.is_recoverable() => {
                    self.reporter.report_error(&e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.timed_predict(ctx, run, &images) {
                Ok(Some((duration, scores))) => {
                    self.logger
                        .trace(&format!(
                            "Inference time at iteration {} and batch {}: {:.3}ms",
                            run,
                            index,
                            duration.as_secs_f64() * 1000.0
                        ))
                        .correlation_id(ctx.correlation_id)
                        .log();
                    durations.push(duration);
                    images_fed += images.len() as u64;
                    last_scores = scores;
                }
                Ok(None) => {}
                Err(e) if e.is_recoverable() => self.reporter.report_error(&e),
                Err(e) => return Err(e),
            }
        }

        if durations.is_empty() {
            return Ok(None);
        }
        let total: Duration = durations.iter().sum();
        let mean = total / durations.len() as u32;

        let (classifications, top_classes) = self.classify(ctx, &last_scores);
        Ok(Some(IterationOutcome {
            duration: mean,
            images: images_fed,
            batches: durations.len() as u64,
            classifications,
            top_classes,
        }))
    }

    /// Preprocess, prepare and time one predictor call.
    ///
    /// Returns the duration of the configured timed region and one score
    /// vector per image, or `None` when preprocessing produced no tensor.
    /// Plan compilation for a new input shape happens between the two timed
    /// phases and is never counted.
    fn timed_predict(
        &self,
        ctx: &mut VariantContext<'_>,
        run: u32,
        images: &[image::DynamicImage],
    ) -> Result<Option<(Duration, Vec<Vec<f32>>)>> {
        let preprocess_start = Instant::now();
        let tensor = match ctx.preprocessor.prepare(images)? {
            Some(tensor) => tensor.as_in_context(ctx.predictor.device()),
            None => return Ok(None),
        };
        let preprocess = preprocess_start.elapsed();
        ctx.predictor.prepare(&[ctx.descriptor.with_tensor_shape(&tensor)])?;

        let mut scope = TensorScope::new(&self.logger, format!("{} run {}", ctx.variant, run));
        let inputs = scope.hold_inputs(vec![tensor]);

        let start = Instant::now();
        let outputs = ctx.predictor.predict(inputs)?;
        let predict = start.elapsed();
        let elapsed = self.config.timed_region.span(preprocess, predict);

        let outputs = scope.hold_outputs(outputs);
        let scores: Vec<Vec<f32>> = outputs
            .first()
            .map(|output: &OutputTensor| output.rows().map(<[f32]>::to_vec).collect())
            .ok_or_else(|| AppError::inference("Model produced no outputs"))?;
        Ok(Some((elapsed, scores)))
    }

    /// Label lookups are best effort: failures are reported and skipped
    fn classify(
        &self,
        ctx: &VariantContext<'_>,
        scores: &[Vec<f32>],
    ) -> (Vec<ClassificationResult>, Vec<ClassificationResult>) {
        let synset = match &ctx.synset {
            Some(synset) => synset,
            None => return (Vec::new(), Vec::new()),
        };

        let mut classifications = Vec::with_capacity(scores.len());
        for row in scores {
            match synset.classify(row) {
                Ok(result) => classifications.push(result),
                Err(e) => self.reporter.report_error(&e),
            }
        }

        let top_classes = match scores.first() {
            Some(row) => synset.top_k(row, self.config.top_k).unwrap_or_else(|e| {
                self.reporter.report_error(&e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        (classifications, top_classes)
    }
}
