use core_types::types::BinId;

/// Защита от аллокации миллионов бинов на мусорных входах.
pub const MAX_BINS_PER_SIDE: u32 = 100_000;

/// Сколько бинов в каждую сторону покрывает диапазон ±range_percent.
/// bins_per_side = floor(range_percent * 100 / bin_step)
pub fn bins_per_side(range_percent: f64, bin_step: u16) -> u32 {
    if bin_step == 0 || !range_percent.is_finite() || range_percent <= 0.0 {
        return 0;
    }
    // 1e-9: чтобы 0.3 * 100 / 10 не превратилось в 29
    let raw = (range_percent * 100.0 / f64::from(bin_step) + 1e-9).floor();
    (raw as u32).min(MAX_BINS_PER_SIDE)
}

/// Симметричный набор id вокруг активного бина, по возрастанию.
/// Длина всегда 2 * bins_per_side + 1.
pub fn resolve_bin_range(active: BinId, range_percent: f64, bin_step: u16) -> Vec<BinId> {
    let side = bins_per_side(range_percent, bin_step) as i32;
    (-side..=side).map(|d| active.offset(d)).collect()
}
