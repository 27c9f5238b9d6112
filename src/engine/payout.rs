use crate::models::zone::DeliveryZone;

/// Courier payment for a delivered order: zone base plus an optional
/// distance-graduated surcharge.
///
/// Billed distance never drops below 1 km, including after graduation
/// rounding.
pub fn calculate_payout(zone: &DeliveryZone, distance_km: Option<f64>) -> i64 {
    let base = zone.courier_payment.or(zone.price).unwrap_or(0);

    let rate = match zone.price_per_km {
        Some(rate) if zone.per_km_enabled && rate > 0 => rate,
        _ => return base,
    };

    let mut calc_km = distance_km.unwrap_or(0.0).max(1.0);
    if let Some(step) = zone.graduation_km {
        if step > 0.0 {
            calc_km = ((calc_km / step).round() * step).max(1.0);
        }
    }

    let surcharge = (calc_km * rate as f64).round() as i64;
    base + surcharge
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::calculate_payout;
    use crate::models::zone::DeliveryZone;

    fn zone(
        courier_payment: Option<i64>,
        price: Option<i64>,
        per_km_enabled: bool,
        price_per_km: Option<i64>,
        graduation_km: Option<f64>,
    ) -> DeliveryZone {
        DeliveryZone {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "center".to_string(),
            courier_payment,
            price,
            per_km_enabled,
            price_per_km,
            graduation_km,
        }
    }

    #[test]
    fn base_only_when_per_km_disabled() {
        let z = zone(Some(200), Some(350), false, Some(10), None);
        assert_eq!(calculate_payout(&z, Some(7.0)), 200);
    }

    #[test]
    fn price_is_fallback_for_missing_courier_payment() {
        let z = zone(None, Some(350), false, None, None);
        assert_eq!(calculate_payout(&z, None), 350);
    }

    #[test]
    fn missing_base_and_price_yields_zero_base() {
        let z = zone(None, None, true, Some(10), None);
        assert_eq!(calculate_payout(&z, Some(2.0)), 20);
    }

    #[test]
    fn graduation_rounds_to_nearest_step() {
        // 1.3 km with a 0.5 km step bills as 1.5 km.
        let z = zone(Some(100), None, true, Some(10), Some(0.5));
        assert_eq!(calculate_payout(&z, Some(1.3)), 115);
    }

    #[test]
    fn short_trips_bill_at_least_one_km() {
        let z = zone(Some(100), None, true, Some(10), None);
        assert_eq!(calculate_payout(&z, Some(0.4)), 110);
    }

    #[test]
    fn graduation_result_is_reclamped_to_one_km() {
        // 1 km rounded to a 4 km step would hit zero; it bills as 1 km.
        let z = zone(Some(100), None, true, Some(10), Some(4.0));
        assert_eq!(calculate_payout(&z, Some(1.0)), 110);
    }

    #[test]
    fn missing_distance_bills_the_minimum() {
        let z = zone(Some(100), None, true, Some(10), None);
        assert_eq!(calculate_payout(&z, None), 110);
    }

    #[test]
    fn zero_rate_means_base_only() {
        let z = zone(Some(100), None, true, Some(0), Some(0.5));
        assert_eq!(calculate_payout(&z, Some(3.0)), 100);
    }
}
