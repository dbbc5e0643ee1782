//! Plain-text rendering of a published snapshot.

use aegis_core::{ActiveEffect, EffectSummary, Snapshot};
use aegis_types::formatting::{format_reduction, format_remaining, format_shield};

pub fn render(snapshot: &Snapshot, european: bool) -> String {
    let mut lines = vec![format!("tick {}", snapshot.tick)];

    lines.push(summary_line("Local", &snapshot.local, european));
    lines.extend(effect_lines(&snapshot.local.active_effects, european));

    if snapshot.target.entity_id != 0 {
        lines.push(summary_line("Target", &snapshot.target, european));
        lines.extend(effect_lines(&snapshot.target.active_effects, european));
    }

    lines.push("Party".to_string());
    for (slot, member) in snapshot.party.iter().enumerate() {
        if member.is_empty() {
            continue;
        }
        lines.push(format!(
            "  [{}] #{:<8} phys {:>6}  mag {:>6}  shield {}",
            slot,
            member.entity_id,
            format_reduction(member.physical_reduction_pct, european),
            format_reduction(member.magical_reduction_pct, european),
            format_shield(member.shield_amount, european),
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// One line per tick, for live mode.
pub fn render_compact(snapshot: &Snapshot, european: bool) -> String {
    let members = snapshot.party.iter().filter(|p| !p.is_empty()).count();
    format!(
        "tick {:>5}  local phys {}  mag {}  target phys {}  party {}",
        snapshot.tick,
        format_reduction(snapshot.local.physical_pct, european),
        format_reduction(snapshot.local.magical_pct, european),
        format_reduction(snapshot.target.physical_pct, european),
        members,
    )
}

fn summary_line(label: &str, summary: &EffectSummary, european: bool) -> String {
    format!(
        "{} #{}  phys {}  mag {}  shield {}",
        label,
        summary.entity_id,
        format_reduction(summary.physical_pct, european),
        format_reduction(summary.magical_pct, european),
        format_shield(summary.shield_amount, european),
    )
}

fn effect_lines(effects: &[ActiveEffect], european: bool) -> impl Iterator<Item = String> + '_ {
    effects.iter().map(move |e| {
        format!(
            "    {:>6}  phys {:>6}  mag {:>6}  {}",
            e.id,
            format_reduction(e.physical_pct, european),
            format_reduction(e.magical_pct, european),
            format_remaining(e.remaining_time, european),
        )
    })
}
