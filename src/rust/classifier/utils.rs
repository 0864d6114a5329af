use ndarray::Array1;

pub(crate) fn normalize_vector(vec: &Array1<f32>) -> Array1<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

/// Element-wise mean of equally sized distributions, accumulated in f64.
pub(crate) fn average_vectors(vectors: &[&[f64]], size: usize) -> Vec<f64> {
    if vectors.is_empty() {
        return vec![0.0; size];
    }
    let mut sum = vec![0.0f64; size];
    for v in vectors {
        for (acc, &x) in sum.iter_mut().zip(v.iter()) {
            *acc += x;
        }
    }
    let n = vectors.len() as f64;
    sum.into_iter().map(|x| x / n).collect()
}

/// Index of the largest value; ties keep the earliest index.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_zero_vector_stays_zero() {
        let v = normalize_vector(&Array1::zeros(3));
        assert_eq!(v, Array1::<f32>::zeros(3));
    }

    #[test]
    fn test_normalize_unit_length() {
        let v = normalize_vector(&array![3.0f32, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_average_and_argmax() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        let c = [1.0, 0.0];
        let avg = average_vectors(&[&a, &b, &c], 2);
        assert!((avg[0] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(argmax(&avg), Some(0));
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[]), None);
    }
}
