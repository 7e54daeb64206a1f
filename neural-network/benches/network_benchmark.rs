use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array2;
use neural_network::{ActivationType, FitOptions, NetworkConfigBuilder, Sequential, WeightInit};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn train_bag_of_words_epoch(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let rows = 256;
    let vocabulary = 1000;
    let classes = 46;

    // Sparse binary inputs with a random class per row
    let x = Array2::from_shape_fn((rows, vocabulary), |_| {
        if rng.random::<f64>() < 0.05 { 1.0 } else { 0.0 }
    });
    let mut y = Array2::zeros((rows, classes));
    for mut row in y.rows_mut() {
        let class = rng.random_range(0..classes);
        row[class] = 1.0;
    }

    for activation in [ActivationType::Sigmoid, ActivationType::Tanh, ActivationType::Relu] {
        let config = NetworkConfigBuilder::default()
            .layer_count(2)
            .layer_width(256)
            .activation(activation)
            .dropout_rate(0.5)
            .weight_init(WeightInit::TruncatedNormal)
            .build()
            .unwrap();
        let options = FitOptions {
            batch_size: 16,
            epochs: 1,
            validation_split: 0.1,
            shuffle: true,
            verbose: false,
        };

        let name = format!("fit_one_epoch_{activation}");
        c.bench_function(&name, |b| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(1);
                let mut network =
                    Sequential::build(black_box(&config), vocabulary, classes, &mut rng).unwrap();
                network
                    .fit(black_box(&x), black_box(&y), &options, &mut rng)
                    .unwrap()
            })
        });
    }
}

criterion_group!(benches, train_bag_of_words_epoch);
criterion_main!(benches);
