//! K-means color clustering in RGB space
//!
//! Partitions eligible logo pixels into `k` clusters and returns one centroid
//! per cluster. Centroids are integer colors (floor of the mean), so the
//! iteration runs over a finite state space and always settles.
//!
//! Output order follows the random seeding order. Cluster 0 is not the
//! dominant color.

use rand::Rng;
use thiserror::Error;

use crate::palette::Rgb;

/// Clustering failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("insufficient data: {available} eligible pixels, {requested} clusters requested")]
    InsufficientData { available: usize, requested: usize },

    #[error("at least one cluster must be requested")]
    NoClusters,
}

/// Converged centroids plus the number of assignment rounds it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clustering {
    pub centroids: Vec<Rgb>,
    pub iterations: usize,
}

/// Cluster `pixels` into `k` colors.
///
/// Seeds are `k` distinct pixel indices drawn uniformly without replacement
/// from `rng`. Pass a seeded RNG for reproducible output.
pub fn cluster<R: Rng + ?Sized>(
    pixels: &[Rgb],
    k: usize,
    rng: &mut R,
) -> Result<Clustering, ClusterError> {
    let seeds = seed_centroids(pixels, k, rng)?;
    Ok(refine(pixels, seeds))
}

/// Pick `k` initial centroids from distinct pixel indices
pub fn seed_centroids<R: Rng + ?Sized>(
    pixels: &[Rgb],
    k: usize,
    rng: &mut R,
) -> Result<Vec<Rgb>, ClusterError> {
    if k == 0 {
        return Err(ClusterError::NoClusters);
    }
    if pixels.len() < k {
        return Err(ClusterError::InsufficientData {
            available: pixels.len(),
            requested: k,
        });
    }

    Ok(rand::seq::index::sample(rng, pixels.len(), k)
        .into_iter()
        .map(|i| pixels[i])
        .collect())
}

/// Run Lloyd iterations from the given centroids until none of them moves.
///
/// A cluster that receives no pixels in a round keeps its previous centroid.
pub fn refine(pixels: &[Rgb], mut centroids: Vec<Rgb>) -> Clustering {
    let k = centroids.len();
    let mut assignment = vec![0usize; pixels.len()];
    let mut iterations = 0;

    loop {
        iterations += 1;

        for (slot, pixel) in assignment.iter_mut().zip(pixels) {
            *slot = nearest(pixel, &centroids);
        }

        let mut sums = vec![[0u64; 3]; k];
        let mut counts = vec![0u64; k];
        for (&cluster, pixel) in assignment.iter().zip(pixels) {
            sums[cluster][0] += pixel.r as u64;
            sums[cluster][1] += pixel.g as u64;
            sums[cluster][2] += pixel.b as u64;
            counts[cluster] += 1;
        }

        let next: Vec<Rgb> = centroids
            .iter()
            .enumerate()
            .map(|(i, &previous)| match counts[i] {
                0 => previous,
                n => Rgb::new(
                    (sums[i][0] / n) as u8,
                    (sums[i][1] / n) as u8,
                    (sums[i][2] / n) as u8,
                ),
            })
            .collect();

        if next == centroids {
            return Clustering {
                centroids,
                iterations,
            };
        }
        centroids = next;
    }
}

/// Index of the closest centroid; the lowest index wins ties
#[inline]
pub fn nearest(pixel: &Rgb, centroids: &[Rgb]) -> usize {
    let mut best_index = 0;
    let mut best_dist = u32::MAX;

    for (i, c) in centroids.iter().enumerate() {
        let dist = pixel.distance_squared(c);
        if dist < best_dist {
            best_dist = dist;
            best_index = i;
        }
    }

    best_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn make_rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    fn repeat(color: Rgb, n: usize) -> Vec<Rgb> {
        vec![color; n]
    }

    /// Small palette with near-equidistant colors that tends to shuffle
    /// pixels between clusters for a few rounds
    fn adversarial_palette() -> Vec<Rgb> {
        let mut pixels = Vec::new();
        for i in 0..12u8 {
            pixels.push(Rgb::new(i * 20, 255 - i * 20, (i % 3) * 100));
            pixels.push(Rgb::new(128, i * 21, 128));
            pixels.push(Rgb::new(i, i, i));
        }
        pixels
    }

    #[test]
    fn test_returns_k_centroids() {
        let pixels = adversarial_palette();
        for k in 1..=5 {
            let centroids = cluster(&pixels, k, &mut make_rng(7)).unwrap().centroids;
            assert_eq!(centroids.len(), k);
        }
    }

    #[test]
    fn test_terminates_on_adversarial_palette() {
        let pixels = adversarial_palette();
        for seed in 0..50 {
            let seeds = seed_centroids(&pixels, 3, &mut make_rng(seed)).unwrap();
            let result = refine(&pixels, seeds);
            assert!(
                result.iterations < 10_000,
                "seed {} took {} iterations",
                seed,
                result.iterations
            );
        }
    }

    #[test]
    fn test_uniform_input_repeats_centroid() {
        let gray = Rgb::new(10, 10, 10);
        let pixels = repeat(gray, 100);

        let centroids = cluster(&pixels, 3, &mut make_rng(1)).unwrap().centroids;
        assert_eq!(centroids, vec![gray, gray, gray]);
    }

    #[test]
    fn test_known_split_recovers_both_colors() {
        let black = Rgb::new(0, 0, 0);
        let gray = Rgb::new(100, 100, 100);
        let mut pixels = repeat(black, 50);
        pixels.extend(repeat(gray, 50));

        for seed in 0..20 {
            let mut centroids = cluster(&pixels, 2, &mut make_rng(seed)).unwrap().centroids;
            centroids.sort_by_key(|c| c.r);
            assert_eq!(centroids, vec![black, gray], "seed {}", seed);
        }
    }

    #[test]
    fn test_insufficient_data() {
        let pixels = vec![Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)];
        let result = cluster(&pixels, 3, &mut make_rng(0));
        assert_eq!(
            result,
            Err(ClusterError::InsufficientData {
                available: 2,
                requested: 3
            })
        );

        assert_eq!(
            cluster(&[], 3, &mut make_rng(0)),
            Err(ClusterError::InsufficientData {
                available: 0,
                requested: 3
            })
        );
    }

    #[test]
    fn test_zero_clusters_rejected() {
        let pixels = vec![Rgb::new(1, 2, 3)];
        assert_eq!(
            cluster(&pixels, 0, &mut make_rng(0)),
            Err(ClusterError::NoClusters)
        );
    }

    #[test]
    fn test_seeds_are_distinct_indices() {
        // Three pixels, three clusters: every pixel must be used exactly once
        let pixels = vec![Rgb::new(1, 0, 0), Rgb::new(0, 1, 0), Rgb::new(0, 0, 1)];
        for seed in 0..20 {
            let mut seeds = seed_centroids(&pixels, 3, &mut make_rng(seed)).unwrap();
            seeds.sort_by_key(|c| (c.r, c.g, c.b));
            assert_eq!(
                seeds,
                vec![Rgb::new(0, 0, 1), Rgb::new(0, 1, 0), Rgb::new(1, 0, 0)]
            );
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let pixels = adversarial_palette();
        let a = cluster(&pixels, 3, &mut make_rng(99)).unwrap().centroids;
        let b = cluster(&pixels, 3, &mut make_rng(99)).unwrap().centroids;
        assert_eq!(a, b);
    }

    #[test]
    fn test_tie_goes_to_lower_index() {
        let centroids = [Rgb::new(0, 0, 0), Rgb::new(10, 10, 10)];
        assert_eq!(nearest(&Rgb::new(5, 5, 5), &centroids), 0);

        // Same tie inside a full run: (5,5,5) joins cluster 0
        let pixels = vec![Rgb::new(0, 0, 0), Rgb::new(10, 10, 10), Rgb::new(5, 5, 5)];
        let result = refine(&pixels, centroids.to_vec());
        assert_eq!(
            result.centroids,
            vec![Rgb::new(2, 2, 2), Rgb::new(10, 10, 10)]
        );
    }

    #[test]
    fn test_empty_cluster_keeps_centroid() {
        let black = Rgb::new(0, 0, 0);
        let gray = Rgb::new(50, 50, 50);
        let pixels = vec![black, black, gray];

        // Cluster 1 duplicates cluster 0 and never wins a pixel
        let result = refine(&pixels, vec![black, black, gray]);
        assert_eq!(result.centroids, vec![black, black, gray]);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_floor_mean() {
        let pixels = vec![Rgb::new(0, 1, 255), Rgb::new(1, 2, 254)];
        let result = refine(&pixels, vec![pixels[0]]);
        assert_eq!(result.centroids, vec![Rgb::new(0, 1, 254)]);
    }
}
