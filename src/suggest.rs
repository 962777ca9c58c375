// Mitigation suggestions for a single row.
//
// Every rule is checked independently and in a fixed order; any number of
// them may fire. The general fallback only appears when nothing else did.
use crate::types::{ComputedRow, Suggestion, SuggestionKind};

const LONG_TRUCK_LEG_KM: f64 = 500.0;

fn push(out: &mut Vec<Suggestion>, kind: SuggestionKind, text: &str, share: f64, total: f64) {
    out.push(Suggestion {
        kind,
        text: text.to_string(),
        estimated_reduction_kg: total * share,
    });
}

pub fn suggest(row: &ComputedRow) -> Vec<Suggestion> {
    let t = row.transport_kg;
    let m = row.material_kg;
    let e = row.manufacturing_kg;
    let total = row.total_kg;
    let mut out = Vec::new();

    if row.mode == "air" {
        push(
            &mut out,
            SuggestionKind::ShiftAirFreight,
            "Shift air freight to sea/rail for long legs.",
            0.60,
            total,
        );
    }
    if row.mode == "truck" && row.distance_km > LONG_TRUCK_LEG_KM {
        push(
            &mut out,
            SuggestionKind::ShiftLongTruckLegs,
            "Move long-distance truck legs to rail/sea or consolidate shipments.",
            0.30,
            total,
        );
    }
    if m > t && m > e {
        if row.material_type == "plastic" {
            push(
                &mut out,
                SuggestionKind::RecycledPackaging,
                "Use recycled plastic or redesign packaging to reduce plastic mass.",
                0.25,
                total,
            );
        } else {
            push(
                &mut out,
                SuggestionKind::ReduceMaterial,
                "Reduce material weight or increase recycled content.",
                0.20,
                total,
            );
        }
    }
    if t > m && t > e {
        push(
            &mut out,
            SuggestionKind::ConsolidateShipments,
            "Consolidate shipments and optimise routing to cut transport emissions.",
            0.18,
            total,
        );
    }
    if e > t && e > m {
        push(
            &mut out,
            SuggestionKind::RenewableElectricity,
            "Switch to renewable electricity for manufacturing to cut energy emissions.",
            0.40,
            total,
        );
    }
    if out.is_empty() {
        push(
            &mut out,
            SuggestionKind::General,
            "General: optimise routing, consolidation, and material weight reduction.",
            0.10,
            total,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(mode: &str, material: &str, distance_km: f64, t: f64, m: f64, e: f64) -> ComputedRow {
        ComputedRow {
            index: 0,
            stage: "leg".to_string(),
            mode: mode.to_string(),
            material_type: material.to_string(),
            ownership: String::new(),
            distance_km,
            weight_kg: 0.0,
            manufacturing_energy_kwh: 0.0,
            transport_kg: t,
            material_kg: m,
            manufacturing_kg: e,
            total_kg: t + m + e,
            scope1_kg: 0.0,
            scope2_kg: e,
            scope3_kg: t + m,
        }
    }

    fn kinds(s: &[Suggestion]) -> Vec<SuggestionKind> {
        s.iter().map(|x| x.kind).collect()
    }

    #[test]
    fn air_freight_suggests_mode_shift() {
        // 2000 km, 500 kg by air with "other" material: transport 500, material 500.
        let s = suggest(&row("air", "other", 2000.0, 500.0, 500.0, 0.0));
        assert_eq!(s[0].kind, SuggestionKind::ShiftAirFreight);
        assert!((s[0].estimated_reduction_kg - 600.0).abs() < 1e-9);
        // transport and material tie, so no component rule fires
        assert_eq!(kinds(&s), vec![SuggestionKind::ShiftAirFreight]);
    }

    #[test]
    fn air_estimate_is_sixty_percent_of_total() {
        let s = suggest(&row("air", "other", 2000.0, 500.0, 0.0, 0.0));
        assert_eq!(
            kinds(&s),
            vec![SuggestionKind::ShiftAirFreight, SuggestionKind::ConsolidateShipments]
        );
        assert!((s[0].estimated_reduction_kg - 300.0).abs() < 1e-9);
        assert!((s[1].estimated_reduction_kg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn long_truck_leg_fires_only_above_threshold() {
        let long = suggest(&row("truck", "metal", 501.0, 1.0, 10.0, 0.0));
        assert_eq!(
            kinds(&long),
            vec![SuggestionKind::ShiftLongTruckLegs, SuggestionKind::ReduceMaterial]
        );
        assert!((long[0].estimated_reduction_kg - 3.3).abs() < 1e-9);

        let edge = suggest(&row("truck", "metal", 500.0, 1.0, 10.0, 0.0));
        assert_eq!(kinds(&edge), vec![SuggestionKind::ReduceMaterial]);

        let road = suggest(&row("road", "metal", 900.0, 1.0, 10.0, 0.0));
        assert_eq!(kinds(&road), vec![SuggestionKind::ReduceMaterial]);
    }

    #[test]
    fn plastic_material_hotspot_suggests_packaging() {
        let s = suggest(&row("rail", "plastic", 10.0, 1.0, 100.0, 5.0));
        assert_eq!(kinds(&s), vec![SuggestionKind::RecycledPackaging]);
        assert!((s[0].estimated_reduction_kg - 26.5).abs() < 1e-9);
    }

    #[test]
    fn manufacturing_hotspot_suggests_renewables() {
        let s = suggest(&row("air", "other", 10.0, 1.0, 2.0, 50.0));
        assert_eq!(
            kinds(&s),
            vec![SuggestionKind::ShiftAirFreight, SuggestionKind::RenewableElectricity]
        );
        assert!((s[1].estimated_reduction_kg - 21.2).abs() < 1e-9);
    }

    #[test]
    fn three_way_tie_falls_back_to_general() {
        let s = suggest(&row("rail", "metal", 10.0, 5.0, 5.0, 5.0));
        assert_eq!(kinds(&s), vec![SuggestionKind::General]);
        assert!((s[0].estimated_reduction_kg - 1.5).abs() < 1e-9);
    }

    #[test]
    fn all_zero_row_gets_zero_estimate_fallback() {
        let s = suggest(&row("", "other", 0.0, 0.0, 0.0, 0.0));
        assert_eq!(kinds(&s), vec![SuggestionKind::General]);
        assert_eq!(s[0].estimated_reduction_kg, 0.0);
    }

    #[test]
    fn two_way_tie_at_top_fires_no_component_rule() {
        let s = suggest(&row("sea", "metal", 10.0, 0.0, 7.0, 7.0));
        assert_eq!(kinds(&s), vec![SuggestionKind::General]);
    }
}
