#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use transit_star::core::layout::GoldTable;
use transit_star::core::storage;
use transit_star_types::Table;

pub const TRIPS_DAY_ONE: &str = "\
VIAGEM;LINHA;SUBLINHA;PC;CONCESSIONARIA;SAIDA;CHEGADA;VEICULO;CATRACA SAIDA;CATRACA CHEGADA;OCORRENCIA;JUSTIFICATIVA;TIPO DIA;EXTENSAO;FALHA MECANICA;EVENTO INSEGURO;INDICADOR FECHAMENTO;DATA FECHAMENTO;TOTAL USUARIOS;EMPRESA OPERADORA
01/02/2026;038;1;1;801;09:30;10:15;1234;1000;1050;;;1;12500,5;0;0;1;03/02/2026;50;Viação Sorriso
01/02/2026;038;1;2;801;10:30;11:10;1234;1050;1101;;;1;12500,5;0;0;1;03/02/2026;51;Viação Sorriso
01/02/2026;038;1;2;801;10:30;11:10;1234;1050;1101;;;1;12500,5;0;0;1;03/02/2026;51;Viação Sorriso
";

pub const POSITIONS_DAY_ONE: &str = "\
EV,HR,LT,LG,NV,VL,NL,DG,SV,DT
105,20260201093000,\"-19,9191\",\"-43,9279\",1234,32,38,90,1,\"1,5\"
105,20260201093100.0,\"-19,9201\",\"-43,9301\",1234,28,38,92,1,\"1,9\"
105,not-a-time,\"-19,9301\",\"-43,9401\",1234,28,38,92,1,\"2,0\"
";

pub const TRIPS_DAY_TWO: &str = "\
VIAGEM;LINHA;CONCESSIONARIA;SAIDA;CHEGADA;VEICULO;TOTAL USUARIOS;EMPRESA OPERADORA
01/02/2026;038;801;09:30;10:15;1234;999;Viação Sorriso
02/02/2026;9204;802;07:00;07:40;30125;75;Saritur
";

pub const POSITIONS_DAY_TWO: &str = "\
EV,HR,LT,LG,NV,VL,NL,DG,SV,DT
105,20260202070500,\"-19,8700\",\"-43,9600\",30125,40,9204,180,2,\"0,8\"
";

/// Fresh warehouse with the given extracts in the default input directory
pub fn workspace(extracts: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    replace_extracts(dir.path(), extracts);
    dir
}

/// Swap the raw extracts for a new delivery
pub fn replace_extracts(root: &Path, extracts: &[(&str, &str)]) {
    let bronze = root.join("data/bronze");
    if bronze.exists() {
        fs::remove_dir_all(&bronze).unwrap();
    }
    fs::create_dir_all(&bronze).unwrap();
    for (name, content) in extracts {
        fs::write(bronze.join(name), content).unwrap();
    }
}

pub fn day_one() -> TempDir {
    workspace(&[("mco.csv", TRIPS_DAY_ONE), ("tempo_real.csv", POSITIONS_DAY_ONE)])
}

pub fn gold(root: &Path, table: GoldTable) -> Table {
    storage::read_table(&root.join("data/gold").join(table.file_name()))
        .unwrap()
        .table
}
