use crate::activations::ActivationType;
use crate::error::NetworkError;
use crate::layer::{Activation, Dense, Layer};
use crate::loss::{self, Metric};
use crate::network_config::NetworkConfig;
use crate::optimizer::Optimizer;
use crate::regularization::Dropout;
use crate::training_history::TrainingHistory;
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array2, Axis, s};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

/// Options controlling [`Sequential::fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Rows per gradient step
    pub batch_size: usize,
    /// Number of passes over the training rows
    pub epochs: usize,
    /// Fraction of rows, taken from the end, held out for validation
    pub validation_split: f64,
    /// Shuffle the training rows before every epoch
    pub shuffle: bool,
    /// Show a progress bar while fitting
    pub verbose: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            batch_size: 32,
            epochs: 1,
            validation_split: 0.0,
            shuffle: true,
            verbose: false,
        }
    }
}

/// Loss and metric computed over a whole dataset.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Evaluation {
    pub loss: f64,
    pub accuracy: f64,
}

/// A compiled feed-forward network: an ordered stack of layers, an optimizer, and a
/// binary cross-entropy objective tracked together with an accuracy metric.
///
/// # Examples
///
/// ```
/// use neural_network::{FitOptions, NetworkConfigBuilder, Sequential};
/// use ndarray::array;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let config = NetworkConfigBuilder::default().layer_count(1).build().unwrap();
/// let mut network = Sequential::build(&config, 2, 2, &mut rng).unwrap();
///
/// let x = array![[0.0, 1.0], [1.0, 0.0]];
/// let y = array![[1.0, 0.0], [0.0, 1.0]];
/// let options = FitOptions { batch_size: 2, epochs: 3, ..FitOptions::default() };
/// let history = network.fit(&x, &y, &options, &mut rng).unwrap();
/// assert_eq!(history.epochs(), 3);
/// ```
pub struct Sequential {
    layers: Vec<Layer>,
    optimizer: Box<dyn Optimizer>,
    metric: Metric,
}

impl Sequential {
    /// Builds and compiles a network from `config`.
    ///
    /// The stack is `layer_count` blocks of dense(`layer_width`) → activation → dropout,
    /// then dense(`num_classes`) → sigmoid. Every dense kernel uses the configured
    /// initializer. The configuration is validated before any weights are drawn.
    pub fn build<R: Rng + ?Sized>(
        config: &NetworkConfig,
        input_width: usize,
        num_classes: usize,
        rng: &mut R,
    ) -> Result<Self, NetworkError> {
        config.validate()?;
        if input_width == 0 {
            return Err(NetworkError::ConfigInvalid(
                "input width must be at least 1".to_string(),
            ));
        }
        if num_classes == 0 {
            return Err(NetworkError::ConfigInvalid(
                "number of classes must be at least 1".to_string(),
            ));
        }

        let mut layers = Vec::with_capacity(3 * config.layer_count + 2);
        let mut inputs = input_width;
        for _ in 0..config.layer_count {
            layers.push(Layer::Dense(Dense::new(
                inputs,
                config.layer_width,
                config.weight_init,
                rng,
            )?));
            layers.push(Layer::Activation(Activation::new(config.activation)));
            layers.push(Layer::Dropout(Dropout::new(config.dropout_rate)));
            inputs = config.layer_width;
        }
        layers.push(Layer::Dense(Dense::new(
            inputs,
            num_classes,
            config.weight_init,
            rng,
        )?));
        layers.push(Layer::Activation(Activation::new(ActivationType::Sigmoid)));

        Ok(Self {
            layers,
            optimizer: config.optimizer.create_optimizer(),
            metric: Metric::accuracy_for_binary_crossentropy(),
        })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of dense layers, including the output layer
    pub fn dense_count(&self) -> usize {
        self.layers.iter().filter(|layer| layer.is_dense()).count()
    }

    pub fn input_width(&self) -> usize {
        self.first_dense().map_or(0, Dense::inputs)
    }

    pub fn output_width(&self) -> usize {
        self.last_dense().map_or(0, Dense::units)
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Total number of trainable weights and biases
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .filter_map(|layer| match layer {
                Layer::Dense(dense) => Some(dense.kernel().len() + dense.bias().len()),
                _ => None,
            })
            .sum()
    }

    fn first_dense(&self) -> Option<&Dense> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Dense(dense) => Some(dense),
            _ => None,
        })
    }

    fn last_dense(&self) -> Option<&Dense> {
        self.layers.iter().rev().find_map(|layer| match layer {
            Layer::Dense(dense) => Some(dense),
            _ => None,
        })
    }

    fn forward<R: Rng + ?Sized>(
        &mut self,
        input: &Array2<f64>,
        training: bool,
        rng: &mut R,
    ) -> Array2<f64> {
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current, training, rng);
        }
        current
    }

    fn backward(&mut self, grad: Array2<f64>) {
        let mut current = grad;
        for layer in self.layers.iter_mut().rev() {
            current = layer.backward(current);
        }
    }

    fn apply_gradients(&mut self) {
        self.optimizer.begin_step();
        let optimizer = &mut self.optimizer;
        let mut slot = 0;
        for layer in &mut self.layers {
            if let Layer::Dense(dense) = layer {
                dense.apply_gradients(|param, grad| {
                    optimizer.update(slot, param, grad);
                    slot += 1;
                });
            }
        }
    }

    /// Runs one gradient step on a batch and returns the batch loss and metric.
    fn train_batch<R: Rng + ?Sized>(
        &mut self,
        x: &Array2<f64>,
        y: &Array2<f64>,
        rng: &mut R,
    ) -> (f64, f64) {
        let output = self.forward(x, true, rng);
        let batch_loss = loss::binary_crossentropy(&output, y);
        let batch_metric = self.metric.compute(&output, y);
        self.backward(loss::binary_crossentropy_gradient(&output, y));
        self.apply_gradients();
        (batch_loss, batch_metric)
    }

    fn check_shapes(&self, x: &Array2<f64>, y: &Array2<f64>) -> Result<(), NetworkError> {
        if x.ncols() != self.input_width() {
            return Err(NetworkError::ShapeMismatch {
                what: "input columns",
                expected: self.input_width(),
                actual: x.ncols(),
            });
        }
        if y.ncols() != self.output_width() {
            return Err(NetworkError::ShapeMismatch {
                what: "target columns",
                expected: self.output_width(),
                actual: y.ncols(),
            });
        }
        if x.nrows() != y.nrows() {
            return Err(NetworkError::ShapeMismatch {
                what: "target rows",
                expected: x.nrows(),
                actual: y.nrows(),
            });
        }
        if x.nrows() == 0 {
            return Err(NetworkError::EmptyInput("no rows to process"));
        }
        Ok(())
    }

    /// Trains the network with mini-batch gradient descent.
    ///
    /// The last `validation_split` fraction of rows is held out before shuffling and
    /// scored in inference mode after every epoch. Training loss and accuracy are the
    /// row-weighted means of the per-batch values seen during the epoch.
    ///
    /// # Errors
    ///
    /// Returns an error on shape mismatches, an unusable validation split, a zero
    /// batch size, or a loss that stops being finite.
    pub fn fit<R: Rng + ?Sized>(
        &mut self,
        x: &Array2<f64>,
        y: &Array2<f64>,
        options: &FitOptions,
        rng: &mut R,
    ) -> Result<TrainingHistory, NetworkError> {
        self.check_shapes(x, y)?;
        if options.batch_size == 0 {
            return Err(NetworkError::ConfigInvalid(
                "batch size must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&options.validation_split) {
            return Err(NetworkError::InvalidValidationSplit(options.validation_split));
        }

        let rows = x.nrows();
        let split_at = (rows as f64 * (1.0 - options.validation_split)) as usize;
        if split_at == 0 {
            return Err(NetworkError::InvalidValidationSplit(options.validation_split));
        }
        let (x_train, x_val) = x.view().split_at(Axis(0), split_at);
        let (y_train, y_val) = y.view().split_at(Axis(0), split_at);
        let (x_val, y_val) = (x_val.to_owned(), y_val.to_owned());
        let has_validation = x_val.nrows() > 0;

        tracing::debug!(
            train_rows = split_at,
            validation_rows = x_val.nrows(),
            batch_size = options.batch_size,
            epochs = options.epochs,
            "starting fit"
        );

        let progress = epoch_progress(options);
        let mut history = TrainingHistory::new();
        let mut indices: Vec<usize> = (0..split_at).collect();

        for epoch in 0..options.epochs {
            if options.shuffle {
                indices.shuffle(rng);
            }

            let (mut loss_sum, mut metric_sum) = (0.0, 0.0);
            for batch in indices.chunks(options.batch_size) {
                let x_batch = x_train.select(Axis(0), batch);
                let y_batch = y_train.select(Axis(0), batch);
                let (batch_loss, batch_metric) = self.train_batch(&x_batch, &y_batch, rng);
                if !batch_loss.is_finite() {
                    progress.abandon();
                    return Err(NetworkError::NonFiniteLoss { epoch });
                }
                loss_sum += batch_loss * batch.len() as f64;
                metric_sum += batch_metric * batch.len() as f64;
            }
            let train_loss = loss_sum / split_at as f64;
            let train_accuracy = metric_sum / split_at as f64;

            let validation = if has_validation {
                self.score(&x_val, &y_val, options.batch_size, rng)
            } else {
                Evaluation {
                    loss: f64::NAN,
                    accuracy: f64::NAN,
                }
            };

            history.record_epoch(
                train_loss,
                train_accuracy,
                validation.loss,
                validation.accuracy,
            );
            tracing::debug!(
                epoch,
                loss = train_loss,
                accuracy = train_accuracy,
                val_loss = validation.loss,
                val_accuracy = validation.accuracy,
                "epoch complete"
            );
            progress.set_message(format!(
                "loss: {:.4} - acc: {:.4} - val_loss: {:.4} - val_acc: {:.4}",
                train_loss, train_accuracy, validation.loss, validation.accuracy
            ));
            progress.inc(1);
        }

        progress.finish();
        Ok(history)
    }

    /// Computes loss and metric over `x`/`y` in inference mode.
    pub fn evaluate(
        &mut self,
        x: &Array2<f64>,
        y: &Array2<f64>,
        batch_size: usize,
    ) -> Result<Evaluation, NetworkError> {
        self.check_shapes(x, y)?;
        if batch_size == 0 {
            return Err(NetworkError::ConfigInvalid(
                "batch size must be at least 1".to_string(),
            ));
        }
        // Inference never draws from the generator; any source will do.
        let mut rng = rand::rng();
        Ok(self.score(x, y, batch_size, &mut rng))
    }

    fn score<R: Rng + ?Sized>(
        &mut self,
        x: &Array2<f64>,
        y: &Array2<f64>,
        batch_size: usize,
        rng: &mut R,
    ) -> Evaluation {
        let rows = x.nrows();
        let (mut loss_sum, mut metric_sum) = (0.0, 0.0);
        let mut start = 0;
        while start < rows {
            let end = (start + batch_size).min(rows);
            let x_batch = x.slice(s![start..end, ..]).to_owned();
            let y_batch = y.slice(s![start..end, ..]).to_owned();
            let output = self.forward(&x_batch, false, rng);
            let weight = (end - start) as f64;
            loss_sum += loss::binary_crossentropy(&output, &y_batch) * weight;
            metric_sum += self.metric.compute(&output, &y_batch) * weight;
            start = end;
        }
        Evaluation {
            loss: loss_sum / rows as f64,
            accuracy: metric_sum / rows as f64,
        }
    }

    /// Returns the network outputs for `x` in inference mode.
    pub fn predict(
        &mut self,
        x: &Array2<f64>,
        batch_size: usize,
    ) -> Result<Array2<f64>, NetworkError> {
        if batch_size == 0 {
            return Err(NetworkError::ConfigInvalid(
                "batch size must be at least 1".to_string(),
            ));
        }
        if x.ncols() != self.input_width() {
            return Err(NetworkError::ShapeMismatch {
                what: "input columns",
                expected: self.input_width(),
                actual: x.ncols(),
            });
        }
        let mut rng = rand::rng();
        let mut outputs = Array2::zeros((x.nrows(), self.output_width()));
        let mut start = 0;
        while start < x.nrows() {
            let end = (start + batch_size).min(x.nrows());
            let batch = x.slice(s![start..end, ..]).to_owned();
            let output = self.forward(&batch, false, &mut rng);
            outputs.slice_mut(s![start..end, ..]).assign(&output);
            start = end;
        }
        Ok(outputs)
    }

    /// Multi-line description of the layer stack
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

fn epoch_progress(options: &FitOptions) -> ProgressBar {
    if !options.verbose {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(options.epochs as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}/{len:3} Epoch {msg}",
    ) {
        progress.set_style(style.progress_chars("##-"));
    }
    progress
}

impl fmt::Display for Sequential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, layer) in self.layers.iter().enumerate() {
            writeln!(f, "{i:>3}: {layer}")?;
        }
        write!(f, "trainable parameters: {}", self.parameter_count())
    }
}

impl fmt::Debug for Sequential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequential")
            .field("layers", &self.layers.len())
            .field("optimizer", &self.optimizer.optimizer_type())
            .field("metric", &self.metric)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initializers::WeightInit;
    use crate::network_config::NetworkConfigBuilder;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn small_config(layer_count: usize) -> NetworkConfig {
        NetworkConfigBuilder::default()
            .layer_count(layer_count)
            .layer_width(8)
            .activation(ActivationType::Relu)
            .dropout_rate(0.0)
            .weight_init(WeightInit::GlorotUniform)
            .build()
            .unwrap()
    }

    /// Two clusters, one-hot targets over two classes
    fn toy_data() -> (Array2<f64>, Array2<f64>) {
        let x = array![
            [1.0, 0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 1.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let y = array![
            [1.0, 0.0],
            [1.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [0.0, 1.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [0.0, 1.0],
        ];
        (x, y)
    }

    #[test]
    fn test_build_structure() {
        let mut rng = StdRng::seed_from_u64(0);
        for n in 1..=4 {
            let network = Sequential::build(&small_config(n), 10, 3, &mut rng).unwrap();
            assert_eq!(network.dense_count(), n + 1);
            assert_eq!(network.layers().len(), 3 * n + 2);

            for block in network.layers()[..3 * n].chunks(3) {
                assert!(matches!(block[0], Layer::Dense(_)));
                assert!(matches!(
                    block[1],
                    Layer::Activation(ref a) if a.kind() == ActivationType::Relu
                ));
                assert!(matches!(block[2], Layer::Dropout(_)));
            }
            assert!(matches!(network.layers()[3 * n], Layer::Dense(ref d) if d.units() == 3));
            assert!(matches!(
                network.layers()[3 * n + 1],
                Layer::Activation(ref a) if a.kind() == ActivationType::Sigmoid
            ));
            assert_eq!(network.input_width(), 10);
            assert_eq!(network.output_width(), 3);
        }
    }

    #[test]
    fn test_build_rejects_zero_layers() {
        let mut config = small_config(1);
        config.layer_count = 0;
        let result = Sequential::build(&config, 10, 3, &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(NetworkError::ConfigInvalid(_))));
    }

    #[test]
    fn test_parameter_count() {
        let network =
            Sequential::build(&small_config(2), 10, 3, &mut StdRng::seed_from_u64(0)).unwrap();
        // (10*8 + 8) + (8*8 + 8) + (8*3 + 3)
        assert_eq!(network.parameter_count(), 88 + 72 + 27);
        assert!(network.summary().contains("trainable parameters: 187"));
    }

    #[test]
    fn test_fit_history_length_and_learning() {
        let mut rng = StdRng::seed_from_u64(11);
        let (x, y) = toy_data();
        let mut network = Sequential::build(&small_config(1), 4, 2, &mut rng).unwrap();
        let before = network.evaluate(&x, &y, 4).unwrap();

        let options = FitOptions {
            batch_size: 2,
            epochs: 60,
            validation_split: 0.25,
            shuffle: true,
            verbose: false,
        };
        let history = network.fit(&x, &y, &options, &mut rng).unwrap();
        assert_eq!(history.loss.len(), 60);
        assert_eq!(history.val_accuracy.len(), 60);
        assert!(history.val_loss.iter().all(|v| v.is_finite()));

        let after = network.evaluate(&x, &y, 4).unwrap();
        assert!(after.loss < before.loss);
    }

    #[test]
    fn test_fit_is_deterministic_for_a_seed() {
        let (x, y) = toy_data();
        let options = FitOptions {
            batch_size: 3,
            epochs: 5,
            validation_split: 0.25,
            ..FitOptions::default()
        };
        let run = || {
            let mut rng = StdRng::seed_from_u64(5);
            let mut config = small_config(2);
            config.dropout_rate = 0.5;
            let mut network = Sequential::build(&config, 4, 2, &mut rng).unwrap();
            let history = network.fit(&x, &y, &options, &mut rng).unwrap();
            (history, network.evaluate(&x, &y, 3).unwrap())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_fit_rejects_bad_inputs() {
        let mut rng = StdRng::seed_from_u64(0);
        let (x, y) = toy_data();
        let mut network = Sequential::build(&small_config(1), 4, 2, &mut rng).unwrap();

        let wrong_width = Array2::zeros((8, 3));
        assert!(matches!(
            network.fit(&wrong_width, &y, &FitOptions::default(), &mut rng),
            Err(NetworkError::ShapeMismatch { .. })
        ));

        let options = FitOptions {
            validation_split: 1.0,
            ..FitOptions::default()
        };
        assert!(matches!(
            network.fit(&x, &y, &options, &mut rng),
            Err(NetworkError::InvalidValidationSplit(_))
        ));
    }

    #[test]
    fn test_predict_is_sigmoid_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        let (x, _) = toy_data();
        let mut network = Sequential::build(&small_config(2), 4, 2, &mut rng).unwrap();
        let outputs = network.predict(&x, 3).unwrap();
        assert_eq!(outputs.dim(), (8, 2));
        assert!(outputs.iter().all(|&p| p > 0.0 && p < 1.0));
    }

    #[test]
    fn test_zero_batch_size_rejected_everywhere() {
        let mut rng = StdRng::seed_from_u64(0);
        let (x, y) = toy_data();
        let mut network = Sequential::build(&small_config(1), 4, 2, &mut rng).unwrap();

        let options = FitOptions {
            batch_size: 0,
            ..FitOptions::default()
        };
        assert!(matches!(
            network.fit(&x, &y, &options, &mut rng),
            Err(NetworkError::ConfigInvalid(_))
        ));
        assert!(matches!(
            network.evaluate(&x, &y, 0),
            Err(NetworkError::ConfigInvalid(_))
        ));
        assert!(matches!(
            network.predict(&x, 0),
            Err(NetworkError::ConfigInvalid(_))
        ));
    }
}
