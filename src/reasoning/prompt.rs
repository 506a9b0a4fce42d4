//! Prompt texts for the two reasoning calls.

use crate::analysis::Extraction;

/// System message for the similarity analysis.
pub const ANALYSIS_SYSTEM_PROMPT: &str =
    "你是一个音频分析专家，能够根据音频特征判断音色相似度和克隆效果。";

/// System message for the improvement suggestions.
pub const IMPROVEMENT_SYSTEM_PROMPT: &str =
    "你是一个音频克隆专家，能够根据分析结果提出改进克隆效果的建议。";

const ANALYSIS_HEADER: &str =
    "以下是两段音频的特征描述，请判断它们的音色是否相近，以及克隆效果是否准确。注意，两段音频的时长可能不同：";
const ANALYSIS_REQUEST: &str = "请分析并给出结论，同时给出相似度打分（满分 100%）。";
const IMPROVEMENT_HEADER: &str = "以下是对两段音频的分析结果：";
const IMPROVEMENT_REQUEST: &str = "请根据分析结果，给出改进克隆效果的具体建议。";

/// User message asking for a similarity verdict on two feature sets.
///
/// Durations are printed with two decimals; failed extractions appear as `{}`.
pub fn analysis_prompt(
    first_duration_secs: f64,
    second_duration_secs: f64,
    first: &Extraction,
    second: &Extraction,
) -> String {
    format!(
        "{ANALYSIS_HEADER}\n\n\
         音频 1 时长: {first_duration_secs:.2} 秒\n\
         音频 2 时长: {second_duration_secs:.2} 秒\n\n\
         音频 1 特征：\n{first}\n\
         音频 2 特征：\n{second}\n\n\
         {ANALYSIS_REQUEST}"
    )
}

/// User message asking for concrete improvements given the analysis answer.
pub fn improvement_prompt(analysis: &str) -> String {
    format!("{IMPROVEMENT_HEADER}\n\n{analysis}\n\n{IMPROVEMENT_REQUEST}")
}
