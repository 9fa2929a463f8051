//! API 관련도 판정
//!
//! ## 기능
//! - 명시된 대상 API가 존재하면 그것만 사용
//! - 질문에 등장하는 키워드/동의어/id/이름으로 활성 API 점수 계산
//! - 점수가 있는 API가 없으면 활성 API 전체로 대체

use apilink_foundation::{ApiDescriptor, ApiRegistry};
use tracing::{debug, info, warn};

/// 점수 가중치
const KEYWORD_WEIGHT: u32 = 1;
const SYNONYM_WEIGHT: u32 = 2;
const NAME_WEIGHT: u32 = 3;

/// 점수가 매겨진 API
#[derive(Debug, Clone)]
pub struct ScoredApi {
    pub api: ApiDescriptor,
    pub score: u32,
}

/// 질문 하나에 대한 API 점수 (소문자 비교)
pub fn score_api(api: &ApiDescriptor, lower_question: &str) -> u32 {
    let hits = |terms: &[String]| {
        terms
            .iter()
            .filter(|t| !t.is_empty() && lower_question.contains(&t.to_lowercase()))
            .count() as u32
    };

    let mut score = hits(api.keywords.as_slice()) * KEYWORD_WEIGHT
        + hits(api.synonyms.as_slice()) * SYNONYM_WEIGHT;
    if lower_question.contains(&api.id.to_lowercase()) {
        score += NAME_WEIGHT;
    }
    let name = api.name.to_lowercase();
    if name != api.id.to_lowercase() && lower_question.contains(&name) {
        score += NAME_WEIGHT;
    }
    score
}

/// 활성 API를 점수 내림차순으로 정렬 (0점 제외, 동점은 등록 순서)
pub fn rank_apis(apis: Vec<ApiDescriptor>, question: &str) -> Vec<ScoredApi> {
    let lower = question.to_lowercase();
    let mut scored: Vec<ScoredApi> = apis
        .into_iter()
        .filter(|api| api.active)
        .map(|api| {
            let score = score_api(&api, &lower);
            ScoredApi { api, score }
        })
        .filter(|s| s.score > 0)
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// 질문에 관련된 API 선택
pub fn select_relevant(
    registry: &ApiRegistry,
    question: &str,
    target_api: Option<&str>,
) -> Vec<ApiDescriptor> {
    if let Some(target) = target_api.filter(|t| !t.is_empty()) {
        match registry.get(target) {
            Some(api) => {
                info!("Using requested API: {}", target);
                return vec![api];
            }
            None => warn!("Requested API '{}' not found, falling back to detection", target),
        }
    }

    let ranked = rank_apis(registry.active(), question);
    if ranked.is_empty() {
        debug!("No API matched the question, using all active APIs");
        return registry.active();
    }

    for s in &ranked {
        debug!("API {} scored {}", s.api.id, s.score);
    }
    ranked.into_iter().map(|s| s.api).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_ranking() {
        let registry = ApiRegistry::with_builtins();
        let apis = select_relevant(&registry, "Votos por municipio", None);
        assert_eq!(apis[0].id, "trendvoto");
        assert_eq!(apis.len(), 1);
    }

    #[test]
    fn test_synonym_outweighs_keyword() {
        let registry = ApiRegistry::with_builtins();
        let ranked = rank_apis(registry.active(), "inventario de la urna electoral");
        // sabi: 동의어 1개, trendvoto: 키워드 2개(electoral, elector) + 동의어 1개
        assert_eq!(ranked[0].api.id, "trendvoto");
        assert_eq!(ranked[0].score, 4);
        assert_eq!(ranked[1].score, 2);
    }

    #[test]
    fn test_target_api_wins() {
        let registry = ApiRegistry::with_builtins();
        let apis = select_relevant(&registry, "resultados electorales", Some("sabi"));
        assert_eq!(apis.len(), 1);
        assert_eq!(apis[0].id, "sabi");
    }

    #[test]
    fn test_unknown_target_falls_back() {
        let registry = ApiRegistry::with_builtins();
        let apis = select_relevant(&registry, "resultados", Some("missing"));
        assert_eq!(apis[0].id, "trendvoto");
    }

    #[test]
    fn test_no_match_uses_all_active() {
        let registry = ApiRegistry::with_builtins();
        let apis = select_relevant(&registry, "hola", None);
        assert_eq!(apis.len(), 2);
    }
}
