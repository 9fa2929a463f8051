//! 기본 등록 API (자산 관리, 선거 지오포털)

use super::{ApiDescriptor, EndpointDescriptor};

/// 기본 API 디스크립터 목록
pub fn builtin_apis() -> Vec<ApiDescriptor> {
    vec![sabi(), trendvoto()]
}

fn sabi() -> ApiDescriptor {
    ApiDescriptor::new(
        "sabi",
        "SABI",
        "http://localhost:8080/api",
        "Sistema de gestión de activos: usuarios, activos y estadísticas de inventario",
    )
    .api_type("inventory")
    .keywords(&[
        "usuario", "user", "activo", "asset", "sabi", "gestión", "empresa", "usr",
        "cantidad", "total", "marcas", "uso", "baja", "mantenimiento", "disponible",
        "depreciado", "revalorizado", "edificio", "req_mantenimiento", "estadística",
        "consulta", "contar", "cuántos", "cuántas", "número",
    ])
    .synonyms(&["inventario", "bienes", "patrimonio"])
    .endpoint(EndpointDescriptor::get("/usr", "Lista de usuarios").keywords(&["usuario", "user"]))
    .endpoint(EndpointDescriptor::get("/activo", "Lista de activos").keywords(&["activo", "asset"]))
    .endpoint(
        EndpointDescriptor::get("/cantidad/marcas", "Cantidad de activos por marca")
            .keywords(&["marca", "marcas"]),
    )
    .endpoint(
        EndpointDescriptor::get("/cantidad/uso", "Cantidad de activos en uso").keywords(&["uso"]),
    )
    .endpoint(
        EndpointDescriptor::get("/cantidad/baja", "Cantidad de activos dados de baja")
            .keywords(&["baja"]),
    )
    .endpoint(
        EndpointDescriptor::get("/cantidad/mantenimiento", "Cantidad de activos en mantenimiento")
            .keywords(&["mantenimiento"]),
    )
    .endpoint(
        EndpointDescriptor::get("/cantidad/disponible", "Cantidad de activos disponibles")
            .keywords(&["disponible"]),
    )
    .endpoint(
        EndpointDescriptor::get("/cantidad/depreciados", "Cantidad de activos depreciados")
            .keywords(&["depreciado", "depreciados"]),
    )
    .endpoint(
        EndpointDescriptor::get("/cantidad/revalorizados", "Cantidad de activos revalorizados")
            .keywords(&["revalorizado", "revalorizados"]),
    )
    .endpoint(
        EndpointDescriptor::get("/cantidad/edificios", "Cantidad de activos por edificio")
            .keywords(&["edificio", "edificios"]),
    )
    .endpoint(
        EndpointDescriptor::get(
            "/cantidad/req_mantenimiento",
            "Activos que requieren mantenimiento",
        )
        .keywords(&["req_mantenimiento", "requiere"]),
    )
}

fn trendvoto() -> ApiDescriptor {
    ApiDescriptor::new(
        "trendvoto",
        "TrendVoto",
        "http://localhost:8081/api",
        "Geoportal electoral: estados, municipios, recintos, mesas y resultados",
    )
    .api_type("electoral")
    .keywords(&[
        "trendvoto", "geo", "geoportal", "electoral", "elecciones", "votos", "resultados",
        "delegado", "recinto", "municipio", "circunscripción", "mesa", "acta", "estado",
        "provincia", "distrito", "sección", "votación", "censo", "padrón", "elector",
        "escrutinio", "estadística", "mapa", "geográfico", "territorio",
    ])
    .synonyms(&["elección", "sufragio", "urna"])
    .endpoint(
        EndpointDescriptor::get("/geo/buscarEstado", "Lista de estados o departamentos")
            .keywords(&["estado", "departamento", "depto"]),
    )
    .endpoint(
        EndpointDescriptor::get("/geo/listarMunicipios/0", "Lista de municipios")
            .keywords(&["municipio", "municipios"]),
    )
    .endpoint(
        EndpointDescriptor::get("/geo/getRecintos", "Lista de recintos electorales")
            .keywords(&["recinto", "recintos"]),
    )
    .endpoint(
        EndpointDescriptor::get("/geo/listarMesas/0/0", "Lista de mesas de votación")
            .keywords(&["mesa", "mesas", "votación"]),
    )
    .endpoint(
        EndpointDescriptor::get("/resultados/getResultados", "Resultados electorales")
            .keywords(&["resultado", "resultados", "voto", "votos", "escrutinio"]),
    )
    .endpoint(
        EndpointDescriptor::get(
            "/geoportal/datosEstadisticosGeneral/2023",
            "Datos estadísticos generales del geoportal",
        )
        .keywords(&["estadística", "mapa", "geográfico"]),
    )
}
