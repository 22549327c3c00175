use crate::*;
use dcl_core::*;
use dcl_mdp::Mask;
use tch::Tensor;

/// Labelled decision points stacked into tensors.
pub struct Batch {
    features: Tensor,
    legal: Tensor,
    labels: Tensor,
    len: usize,
}

impl Batch {
    /// Stack `(features, legal actions, label)` rows. Every row must share
    /// one width and carry a legal label.
    pub fn new<'a, I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a [f32], &'a Mask, Action)>,
    {
        let mut features = Vec::new();
        let mut legal = Vec::new();
        let mut labels = Vec::new();
        let mut width = None;
        for (x, mask, label) in rows {
            if !mask.allows(label) {
                return Err(Error::MalformedDataset(format!(
                    "label {} is not a legal action",
                    label
                )));
            }
            match width {
                None => width = Some((x.len(), mask.len())),
                Some(w) if w != (x.len(), mask.len()) => {
                    return Err(Error::MalformedDataset(format!(
                        "row of width {:?} in a batch of width {:?}",
                        (x.len(), mask.len()),
                        w
                    )));
                }
                Some(_) => {}
            }
            features.extend_from_slice(x);
            legal.extend_from_slice(mask.as_slice());
            labels.push(label as i64);
        }
        let (inputs, actions) =
            width.ok_or_else(|| Error::MalformedDataset(String::from("empty batch")))?;
        let len = labels.len();
        Ok(Self {
            features: Tensor::from_slice(&features).view([len as i64, inputs as i64]),
            legal: Tensor::from_slice(&legal).view([len as i64, actions as i64]),
            labels: Tensor::from_slice(&labels),
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mean masked NLL of the labels under `model`, tracked by autograd.
    pub fn loss<N>(&self, model: &N) -> Tensor
    where
        N: Network,
    {
        masked_nll(&model.forward(&self.features), &self.legal, &self.labels)
    }

    /// [`Batch::loss`] as a number, without recording gradients.
    pub fn evaluate<N>(&self, model: &N) -> Result<Score>
    where
        N: Network,
    {
        let loss = tch::no_grad(|| self.loss(model));
        f64::try_from(&loss).map(|l| l as Score).map_err(torch)
    }
}
