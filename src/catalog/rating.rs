//! Rating aggregation: average, total, and star histogram.

use serde::{Deserialize, Serialize};

/// Aggregate over a product's ratings. `rating_distribution[0]` is the
/// five-star count, `[4]` the one-star count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingStats {
    pub average_rating: f64,
    pub total_ratings: i64,
    pub rating_distribution: [i64; 5],
}

impl RatingStats {
    pub fn empty() -> Self {
        RatingStats {
            average_rating: 0.0,
            total_ratings: 0,
            rating_distribution: [0; 5],
        }
    }

    /// Aggregates raw 1-5 star rows. Out-of-range rows are skipped rather
    /// than failing the whole aggregate.
    pub fn from_ratings(ratings: &[i64]) -> Self {
        let mut distribution = [0i64; 5];
        let mut sum = 0i64;
        let mut total = 0i64;
        for &stars in ratings {
            if !(1..=5).contains(&stars) {
                continue;
            }
            distribution[(5 - stars) as usize] += 1;
            sum += stars;
            total += 1;
        }
        let average = if total > 0 {
            ((sum as f64 / total as f64) * 10.0).round() / 10.0
        } else {
            0.0
        };
        RatingStats {
            average_rating: average,
            total_ratings: total,
            rating_distribution: distribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RatingStats;

    #[test]
    fn distribution_sums_to_total() {
        let stats = RatingStats::from_ratings(&[5, 5, 4, 3, 1, 2, 5, 4]);
        assert_eq!(stats.total_ratings, 8);
        assert_eq!(stats.rating_distribution.iter().sum::<i64>(), 8);
    }

    #[test]
    fn index_zero_is_the_five_star_count() {
        let stats = RatingStats::from_ratings(&[5, 5, 1]);
        assert_eq!(stats.rating_distribution[0], 2);
        assert_eq!(stats.rating_distribution[4], 1);
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        let stats = RatingStats::from_ratings(&[5, 4, 4]);
        assert_eq!(stats.average_rating, 4.3);
    }

    #[test]
    fn empty_set_yields_zeroes() {
        assert_eq!(RatingStats::from_ratings(&[]), RatingStats::empty());
    }

    #[test]
    fn out_of_range_rows_are_ignored() {
        let stats = RatingStats::from_ratings(&[5, 0, 6, 3]);
        assert_eq!(stats.total_ratings, 2);
        assert_eq!(stats.rating_distribution[0], 1);
        assert_eq!(stats.rating_distribution[2], 1);
    }
}
