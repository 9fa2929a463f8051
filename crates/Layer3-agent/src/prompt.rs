//! 프롬프트 조립과 답변 후처리

use apilink_foundation::ApiDescriptor;
use regex::Regex;
use std::sync::OnceLock;

/// 목록형 질문 답변 최대 길이 (문자)
const LIST_ANSWER_LIMIT: usize = 5000;

/// 일반 답변 최대 길이 (문자)
const ANSWER_LIMIT: usize = 1000;

const LISTING_WORDS: [&str; 4] = ["listame", "muestrame", "enumera", "dame"];
const EXPLAIN_WORDS: [&str; 4] = ["cómo", "como", "explica", "qué"];

/// 질문 형태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStyle {
    /// 데이터 나열 요청
    Listing,
    /// 설명 요청
    Explanation,
    General,
}

impl QuestionStyle {
    pub fn detect(question: &str) -> Self {
        let lower = question.to_lowercase();
        if LISTING_WORDS.iter().any(|w| lower.contains(w)) {
            QuestionStyle::Listing
        } else if EXPLAIN_WORDS.iter().any(|w| lower.contains(w)) {
            QuestionStyle::Explanation
        } else {
            QuestionStyle::General
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            QuestionStyle::Listing => {
                "Responde de manera CONCISA y DIRECTA. Proporciona principalmente los datos \
                 solicitados con formato claro (tablas, listas). Evita explicaciones extensas."
            }
            QuestionStyle::Explanation => {
                "Responde de manera técnica pero concisa. Enfócate en la información práctica."
            }
            QuestionStyle::General => {
                "Responde de manera técnica y específica, pero evita explicaciones \
                 innecesariamente extensas."
            }
        }
    }
}

/// 사용 가능한 API 카탈로그 (한 줄에 하나)
pub fn catalogue(apis: &[ApiDescriptor]) -> String {
    apis.iter()
        .map(|api| {
            format!(
                "- {}: {} ({}) - {}",
                api.id, api.name, api.base_url, api.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 질문 응답 프롬프트
pub fn build_prompt(
    question: &str,
    context: &str,
    all_apis: &[ApiDescriptor],
    relevant: &[ApiDescriptor],
) -> String {
    let targets: Vec<&str> = relevant.iter().map(|api| api.id.as_str()).collect();
    let context = if context.trim().is_empty() {
        "No se pudieron obtener datos en tiempo real."
    } else {
        context.trim_end()
    };

    format!(
        "Eres un asistente especializado en múltiples sistemas empresariales.\n\
         {instruction}\n\n\
         SISTEMAS DISPONIBLES:\n{catalogue}\n\n\
         CONTEXTO Y DATOS OBTENIDOS:\n{context}\n\n\
         PREGUNTA DEL USUARIO: {question}\n\n\
         Sistemas objetivo: {targets}\n\n\
         Si la pregunta es un listado, presenta los datos en formato de tabla o lista clara.\n\
         Si es una pregunta técnica, enfócate en los aspectos prácticos.\n",
        instruction = QuestionStyle::detect(question).instruction(),
        catalogue = catalogue(all_apis),
        context = context,
        question = question,
        targets = targets.join(", "),
    )
}

/// 전체 시스템 요약 프롬프트
pub fn build_summary_prompt(apis: &[ApiDescriptor]) -> String {
    let systems: Vec<String> = apis
        .iter()
        .map(|api| {
            format!(
                "- {}: {}\n   URL: {}\n   Descripción: {}\n   Tipo: {}\n   Endpoints: {} registrados",
                api.id,
                api.name,
                api.base_url,
                api.description,
                api.api_type,
                api.endpoints.len()
            )
        })
        .collect();

    format!(
        "Eres un arquitecto de sistemas. Proporciona un resumen ejecutivo de todos los sistemas disponibles:\n\n\
         SISTEMAS:\n{}\n\n\
         Genera un resumen que incluya:\n\
         1. Capacidades principales de cada sistema\n\
         2. Posibles integraciones entre sistemas\n\
         3. Casos de uso recomendados para cada uno\n\
         4. Arquitectura general recomendada\n\
         5. Consideraciones técnicas importantes\n",
        systems.join("\n\n")
    )
}

fn table_pattern() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"\|.+\n\|.+\n(?:\|.+\n)+").ok())
        .as_ref()
}

fn list_pattern() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?:-|\d+\.\s).+(?:\n(?:-|\d+\.\s).+)*").ok())
        .as_ref()
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push_str("...");
    cut
}

/// 모델 답변 정리
///
/// 목록형 질문은 마크다운 표 또는 목록 부분만 남기고, 그 외에는 길이를 제한합니다.
pub fn shape_answer(answer: &str, question: &str) -> String {
    if QuestionStyle::detect(question) == QuestionStyle::Listing {
        let structured = table_pattern()
            .and_then(|re| re.find(answer))
            .or_else(|| list_pattern().and_then(|re| re.find(answer)));
        if let Some(found) = structured {
            return found.as_str().to_string();
        }
        return truncate_chars(answer, LIST_ANSWER_LIMIT);
    }
    truncate_chars(answer, ANSWER_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apilink_foundation::ApiRegistry;

    #[test]
    fn test_question_style() {
        assert_eq!(QuestionStyle::detect("Dame los usuarios"), QuestionStyle::Listing);
        assert_eq!(QuestionStyle::detect("¿Qué es SABI?"), QuestionStyle::Explanation);
        assert_eq!(QuestionStyle::detect("votos 2023"), QuestionStyle::General);
    }

    #[test]
    fn test_build_prompt() {
        let registry = ApiRegistry::with_builtins();
        let all = registry.all();
        let prompt = build_prompt("votos por mesa", "", &all, &all[1..]);

        assert!(prompt.starts_with("Eres un asistente"));
        assert!(prompt.contains("- sabi: SABI (http://localhost:8080/api)"));
        assert!(prompt.contains("No se pudieron obtener datos en tiempo real."));
        assert!(prompt.contains("PREGUNTA DEL USUARIO: votos por mesa"));
        assert!(prompt.contains("Sistemas objetivo: trendvoto"));
    }

    #[test]
    fn test_summary_prompt() {
        let registry = ApiRegistry::with_builtins();
        let prompt = build_summary_prompt(&registry.all());
        assert!(prompt.contains("Tipo: electoral"));
        assert!(prompt.contains("Endpoints: 6 registrados"));
    }

    #[test]
    fn test_shape_listing_answer() {
        let answer = "Aquí está:\n| id | nombre |\n| --- | --- |\n| 1 | Ana |\nFin";
        assert_eq!(
            shape_answer(answer, "dame usuarios"),
            "| id | nombre |\n| --- | --- |\n| 1 | Ana |\n"
        );

        let answer = "Usuarios:\n- Ana\n- Ever\n\nEso es todo";
        assert_eq!(shape_answer(answer, "listame usuarios"), "- Ana\n- Ever");
    }

    #[test]
    fn test_shape_truncates() {
        let long = "á".repeat(1200);
        let shaped = shape_answer(&long, "votos");
        assert_eq!(shaped.chars().count(), ANSWER_LIMIT + 3);
        assert!(shaped.ends_with("..."));
        assert_eq!(shape_answer("corto", "votos"), "corto");
    }
}
