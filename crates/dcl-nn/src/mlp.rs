use crate::*;
use dcl_core::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Deserialize;
use serde::Serialize;
use tch::Device;
use tch::Kind;
use tch::Tensor;
use tch::nn;
use tch::nn::Module;

/// Hidden layer shape and initialization seed; builds fresh networks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Architecture {
    pub hidden: Vec<usize>,
    pub seed: Seed,
}

impl Default for Architecture {
    fn default() -> Self {
        Self {
            hidden: vec![HIDDEN_WIDTH; HIDDEN_LAYERS],
            seed: INIT_SEED,
        }
    }
}

impl Architecture {
    pub fn build(&self, inputs: usize, outputs: usize) -> Result<Mlp> {
        let widths = std::iter::once(inputs)
            .chain(self.hidden.iter().copied())
            .chain(std::iter::once(outputs))
            .collect::<Vec<_>>();
        Mlp::random(widths, self.seed)
    }
}

/// Dense feed-forward network with ReLU between layers and a linear head.
///
/// Layer `l` keeps its `(out, in)` weight as `l.weight` and its bias as
/// `l.bias` in a CPU [`nn::VarStore`], which is what checkpoints save.
pub struct Mlp {
    widths: Vec<usize>,
    vars: nn::VarStore,
    layers: Vec<nn::Linear>,
}

impl Mlp {
    /// He-uniform hidden layers, Xavier-uniform head, zero biases.
    ///
    /// Initial values come from a seeded [`SmallRng`] rather than the
    /// libtorch generator, so concurrent builds never share random state.
    pub fn random(widths: Vec<usize>, seed: Seed) -> Result<Self> {
        if widths.len() < 2 || widths.contains(&0) {
            return Err(Error::Config(format!("invalid layer widths {:?}", widths)));
        }
        let ref mut rng = SmallRng::seed_from_u64(seed);
        let vars = nn::VarStore::new(Device::Cpu);
        let depth = widths.len() - 1;
        let layers = {
            let root = vars.root();
            widths
                .windows(2)
                .enumerate()
                .map(|(l, pair)| {
                    let (fan_in, fan_out) = (pair[0], pair[1]);
                    let bound = if l + 1 == depth {
                        (6. / (fan_in + fan_out) as f32).sqrt()
                    } else {
                        (6. / fan_in as f32).sqrt()
                    };
                    let weights = (0..fan_in * fan_out)
                        .map(|_| rng.random_range(-bound..=bound))
                        .collect::<Vec<f32>>();
                    let weights = Tensor::from_slice(&weights).view([fan_out as i64, fan_in as i64]);
                    let bias = Tensor::zeros([fan_out as i64], (Kind::Float, Device::Cpu));
                    let ref path = &root / l;
                    nn::Linear {
                        ws: path.var_copy("weight", &weights),
                        bs: Some(path.var_copy("bias", &bias)),
                    }
                })
                .collect::<Vec<_>>()
        };
        Ok(Self {
            widths,
            vars,
            layers,
        })
    }

    pub fn widths(&self) -> &[usize] {
        &self.widths
    }
    pub fn hidden(&self) -> &[usize] {
        &self.widths[1..self.widths.len() - 1]
    }
    pub fn vars_mut(&mut self) -> &mut nn::VarStore {
        &mut self.vars
    }

    /// Every weight and bias, layer by layer, row-major.
    pub fn parameters(&self) -> Result<Vec<f32>> {
        let flat = tch::no_grad(|| {
            let tensors = self
                .layers
                .iter()
                .flat_map(|layer| std::iter::once(&layer.ws).chain(layer.bs.as_ref()))
                .map(|t| t.flatten(0, -1))
                .collect::<Vec<_>>();
            Tensor::cat(&tensors, 0)
        });
        Vec::<f32>::try_from(&flat).map_err(torch)
    }
}

impl Scorer for Mlp {
    fn inputs(&self) -> usize {
        self.widths[0]
    }
    fn outputs(&self) -> usize {
        self.widths[self.widths.len() - 1]
    }
    fn score(&self, features: &[f32]) -> Result<Vec<Score>> {
        if features.len() != self.inputs() {
            return Err(Error::FeatureMismatch {
                expected: self.inputs(),
                found: features.len(),
            });
        }
        let scores = tch::no_grad(|| self.forward(&Tensor::from_slice(features).unsqueeze(0)));
        Vec::<Score>::try_from(&scores.squeeze_dim(0)).map_err(torch)
    }
}

impl Network for Mlp {
    fn vars(&self) -> &nn::VarStore {
        &self.vars
    }
    fn forward(&self, features: &Tensor) -> Tensor {
        let depth = self.layers.len();
        self.layers
            .iter()
            .enumerate()
            .fold(features.shallow_clone(), |x, (l, layer)| match l + 1 < depth {
                true => layer.forward(&x).relu(),
                false => layer.forward(&x),
            })
    }
    fn snapshot(&self) -> Result<Self> {
        let mut copy = Self::random(self.widths.clone(), 0)?;
        copy.vars.copy(&self.vars).map_err(torch)?;
        Ok(copy)
    }
}

impl PartialEq for Mlp {
    fn eq(&self, other: &Self) -> bool {
        self.widths == other.widths && self.parameters().ok() == other.parameters().ok()
    }
}

impl std::fmt::Debug for Mlp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Mlp").field("widths", &self.widths).finish()
    }
}
