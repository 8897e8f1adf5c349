#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use tract_onnx::prelude::*;

use crate::detect::model::{DetectionModel, InferenceOptions};
use crate::detect::result::RawDetection;
use crate::frame::RgbFrame;

/// Tract-based detection model for ONNX files.
///
/// Expects a detection head exported with NMS applied: one output tensor
/// of `[n, 6]` rows `(x1, y1, x2, y2, confidence, class_index)` in
/// inference-square coordinates. Boxes are mapped back to frame
/// coordinates before being returned.
pub struct TractModel {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_size: u32,
    class_names: Vec<String>,
}

impl TractModel {
    /// Load an ONNX model from disk and prepare it for inference at a
    /// fixed square input size.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_size as usize, input_size as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            class_names: vec!["car".to_string(), "free".to_string()],
        })
    }

    /// Override the class-index-to-name mapping.
    pub fn with_class_names(mut self, names: Vec<String>) -> Self {
        self.class_names = names;
        self
    }

    fn build_input(&self, frame: &RgbFrame) -> Result<Tensor> {
        let image = frame
            .to_image()
            .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))?;
        let resized = image::imageops::resize(
            &image,
            self.input_size,
            self.input_size,
            FilterType::Triangle,
        );

        let size = self.input_size as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
            resized.get_pixel(x as u32, y as u32).0[c] as f32 / 255.0
        });
        Ok(input.into_tensor())
    }

    fn decode_output(
        &self,
        outputs: TVec<TValue>,
        frame: &RgbFrame,
        confidence_floor: f32,
    ) -> Result<Vec<RawDetection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let rows = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let rows = rows
            .to_shape((rows.len() / 6, 6))
            .context("model output was not [n, 6] detection rows")?;

        let scale_x = frame.width() as f32 / self.input_size as f32;
        let scale_y = frame.height() as f32 / self.input_size as f32;

        let mut detections = Vec::new();
        for row in rows.outer_iter() {
            let confidence = row[4];
            if confidence < confidence_floor {
                continue;
            }
            let class_index = row[5] as usize;
            let class_name = match self.class_names.get(class_index) {
                Some(name) => name.clone(),
                None => format!("class_{}", class_index),
            };
            detections.push(RawDetection {
                bbox: [
                    row[0] * scale_x,
                    row[1] * scale_y,
                    row[2] * scale_x,
                    row[3] * scale_y,
                ],
                confidence,
                class_name,
            });
        }
        Ok(detections)
    }
}

impl DetectionModel for TractModel {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn infer(&mut self, frame: &RgbFrame, opts: &InferenceOptions) -> Result<Vec<RawDetection>> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode_output(outputs, frame, opts.confidence)
    }
}
