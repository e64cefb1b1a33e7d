use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use super::*;
use crate::foundation::core::Rgb8;
use crate::style_transfer::backend::{Batch, ImageIterator};

/// Loss halves every step; weights record the number of steps taken.
struct HalvingBackend {
    steps: u32,
}

impl TrainingBackend for HalvingBackend {
    fn train_step(&mut self, batch: &Batch) -> OneShotResult<f32> {
        assert!(!batch.is_empty());
        self.steps += 1;
        Ok(1.0 / 2f32.powi(self.steps as i32))
    }

    fn predict(&mut self, image: &ImageFrame, style: usize) -> OneShotResult<ImageFrame> {
        ImageFrame::filled_rgb(image.width(), image.height(), Rgb8::new(style as u8, 0, 0))
    }

    fn weights(&self) -> OneShotResult<WeightMap> {
        Ok(WeightMap::from([("steps".to_owned(), vec![self.steps as f32])]))
    }

    fn load_weights(&mut self, weights: &WeightMap) -> OneShotResult<()> {
        self.steps = weights.get("steps").map_or(0, |w| w[0] as u32);
        Ok(())
    }
}

/// Yields `batches` batches per pass and counts resets.
struct ShortIterator {
    batches: usize,
    served: usize,
    resets: Rc<Cell<usize>>,
}

impl DataIterator for ShortIterator {
    fn next_batch(&mut self) -> OneShotResult<Option<Batch>> {
        if self.served == self.batches {
            return Ok(None);
        }
        self.served += 1;
        let frame = ImageFrame::new(2, 2, 3)?;
        Ok(Some(Batch {
            content: vec![frame.clone()],
            style: vec![frame],
            style_index: vec![0],
        }))
    }

    fn reset(&mut self) {
        self.served = 0;
        self.resets.set(self.resets.get() + 1);
    }
}

#[derive(Default)]
struct MockContext {
    short_iterator: Option<Rc<Cell<usize>>>,
}

impl ComputeContext for MockContext {
    fn create_iterator(&self, params: IteratorParams) -> OneShotResult<Box<dyn DataIterator>> {
        match &self.short_iterator {
            Some(resets) => Ok(Box::new(ShortIterator {
                batches: 2,
                served: 0,
                resets: Rc::clone(resets),
            })),
            None => Ok(Box::new(ImageIterator::new(params)?)),
        }
    }

    fn create_training_backend(
        &self,
        _options: &StyleTransferOptions,
        weights: Option<&WeightMap>,
    ) -> OneShotResult<Box<dyn TrainingBackend>> {
        let mut backend = HalvingBackend { steps: 0 };
        if let Some(w) = weights {
            backend.load_weights(w)?;
        }
        Ok(Box::new(backend))
    }
}

struct RecordingExporter;

impl ModelExporter for RecordingExporter {
    fn export(
        &self,
        weights: &WeightMap,
        options: &ExportOptions,
        path: &Path,
    ) -> OneShotResult<ExportedModel> {
        Ok(ExportedModel {
            path: path.to_path_buf(),
            image_width: options.image_width.unwrap_or(0),
            image_height: options.image_height.unwrap_or(0),
            metadata: [("layers".to_owned(), weights.len().to_string())].into(),
        })
    }
}

fn images(n: usize) -> Vec<FlexImage> {
    (0..n)
        .map(|i| FlexImage::from(ImageFrame::filled_rgb(8, 8, Rgb8::new(i as u8, 1, 2)).unwrap()))
        .collect()
}

fn small_opts(max_iterations: usize) -> OptionMap {
    OptionMap::from([
        ("max_iterations".to_owned(), serde_json::json!(max_iterations)),
        ("batch_size".to_owned(), serde_json::json!(2)),
        ("image_width".to_owned(), serde_json::json!(4)),
        ("image_height".to_owned(), serde_json::json!(4)),
    ])
}

fn trained(styles: usize, iterations: usize) -> StyleTransfer {
    let mut model = StyleTransfer::new(Box::new(MockContext::default()));
    model
        .train(images(styles), images(3), &small_opts(iterations))
        .unwrap();
    model
}

#[test]
fn train_runs_to_max_iterations_and_records_state() {
    let model = trained(2, 5);
    assert_eq!(model.training_iterations(), 5);
    assert_eq!(model.options().num_styles, 2);
    assert_eq!(model.get("num_styles"), Some(&serde_json::json!(2)));
    assert_eq!(model.get("training_loss"), Some(&serde_json::json!(1.0 / 32.0)));
    assert!(model.get("training_time").is_some());
    assert_eq!(model.weights().unwrap()["steps"], vec![5.0]);
}

#[test]
fn init_train_validates_inputs() {
    let mut model = StyleTransfer::new(Box::new(MockContext::default()));
    assert!(model.init_train(Vec::new(), images(1), &OptionMap::new()).is_err());
    assert!(model.init_train(images(1), Vec::new(), &OptionMap::new()).is_err());

    let mut opts = small_opts(1);
    opts.insert("num_styles".to_owned(), serde_json::json!(3));
    assert!(model.init_train(images(2), images(1), &opts).is_err());
    assert!(model.iterate_training().is_err());
    assert!(model.finalize_training().is_err());
}

#[test]
fn init_train_infers_derived_options() {
    let mut model = StyleTransfer::new(Box::new(MockContext::default()));
    model
        .init_train(images(3), images(2), &OptionMap::new())
        .unwrap();
    let o = model.options();
    assert_eq!(o.num_styles, 3);
    assert_eq!(o.batch_size, 6);
    assert_eq!(o.max_iterations, 2000);
    assert_eq!(model.training_iterations(), 0);
}

#[test]
fn exhausted_iterator_is_reset() {
    let resets = Rc::new(Cell::new(0));
    let mut model = StyleTransfer::new(Box::new(MockContext {
        short_iterator: Some(Rc::clone(&resets)),
    }));
    model.init_train(images(1), images(1), &small_opts(5)).unwrap();
    for _ in 0..5 {
        model.iterate_training().unwrap();
    }
    assert_eq!(resets.get(), 2);
    assert_eq!(model.training_iterations(), 5);
}

#[test]
fn predict_emits_one_row_per_image_and_style() {
    let model = trained(3, 1);
    let rows = model.predict(&images(2), None).unwrap();
    let keys: Vec<(usize, usize)> = rows.iter().map(|r| (r.row_id, r.style)).collect();
    assert_eq!(keys, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
    assert_eq!(rows[5].stylized_image.rgb_at(0, 0), Rgb8::new(2, 0, 0));

    let picked = model.predict(&images(1), Some(&[1])).unwrap();
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].style, 1);
    assert!(model.predict(&images(1), Some(&[3])).is_err());
}

#[test]
fn untrained_model_cannot_predict_export_or_save() {
    let model = StyleTransfer::new(Box::new(MockContext::default()));
    assert!(model.predict(&images(1), None).is_err());
    assert!(
        model
            .export(&RecordingExporter, Path::new("m.mlmodel"), &ExportOptions::default())
            .is_err()
    );
    assert!(model.save(Vec::new()).is_err());
}

#[test]
fn export_fills_in_training_size() {
    let model = trained(1, 2);
    let out = model
        .export(
            &RecordingExporter,
            Path::new("out.mlmodel"),
            &ExportOptions {
                image_height: Some(32),
                ..ExportOptions::default()
            },
        )
        .unwrap();
    assert_eq!(out.path, PathBuf::from("out.mlmodel"));
    assert_eq!((out.image_width, out.image_height), (4, 32));
    assert_eq!(out.metadata["layers"], "1");
}

#[test]
fn save_and_load_preserve_the_model() {
    let model = trained(2, 3);
    let mut buf = Vec::new();
    model.save(&mut buf).unwrap();

    let loaded = StyleTransfer::load(Box::new(MockContext::default()), buf.as_slice()).unwrap();
    assert_eq!(loaded.options(), model.options());
    assert_eq!(loaded.get_state().len(), model.get_state().len());
    assert_eq!(loaded.get("training_loss"), model.get("training_loss"));
    assert_eq!(loaded.weights(), model.weights());
    assert_eq!(loaded.predict(&images(1), None).unwrap().len(), 2);
}

#[test]
fn newer_saved_versions_are_rejected() {
    let model = trained(1, 1);
    let mut buf = Vec::new();
    model.save(&mut buf).unwrap();
    let mut doc: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    doc["version"] = serde_json::json!(STYLE_TRANSFER_VERSION + 1);
    let bytes = serde_json::to_vec(&doc).unwrap();
    let err = StyleTransfer::load(Box::new(MockContext::default()), bytes.as_slice()).unwrap_err();
    assert!(matches!(err, OneShotError::Validation(_)));
}

#[test]
fn custom_model_import() {
    let mut model = StyleTransfer::new(Box::new(MockContext::default()));
    let data = CustomModelData {
        weights: WeightMap::from([("steps".to_owned(), vec![7.0])]),
        num_styles: 4,
        options: OptionMap::from([("image_width".to_owned(), serde_json::json!(128))]),
    };
    assert!(
        model
            .import_from_custom_model(data.clone(), STYLE_TRANSFER_VERSION + 1)
            .is_err()
    );
    model.import_from_custom_model(data, 1).unwrap();
    assert_eq!(model.options().num_styles, 4);
    assert_eq!(model.options().image_width, 128);
    assert_eq!(model.predict(&images(1), None).unwrap().len(), 4);

    let empty = CustomModelData {
        weights: WeightMap::new(),
        num_styles: 1,
        options: OptionMap::new(),
    };
    assert!(model.import_from_custom_model(empty, 1).is_err());
}
