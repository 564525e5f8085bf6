//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use textpatch::core::{detect_media_type_by_file_name, format_output_name};

    #[test]
    fn html() {
        assert_eq!(format_output_name("index.html"), "index-traduzido.html");
    }

    #[test]
    fn last_dot_wins() {
        assert_eq!(format_output_name("app.strings.xml"), "app.strings-traduzido.xml");
    }

    #[test]
    fn no_extension() {
        assert_eq!(format_output_name("README"), "README-traduzido");
    }

    #[test]
    fn hidden_file() {
        assert_eq!(format_output_name(".json"), ".json-traduzido");
    }

    #[test]
    fn media_types() {
        assert_eq!(
            detect_media_type_by_file_name("a-traduzido.json"),
            "application/json;charset=utf-8"
        );
        assert_eq!(
            detect_media_type_by_file_name("a.XML"),
            "application/xml;charset=utf-8"
        );
        assert_eq!(
            detect_media_type_by_file_name("a.htm"),
            "text/html;charset=utf-8"
        );
        assert_eq!(
            detect_media_type_by_file_name("log.txt"),
            "text/plain;charset=utf-8"
        );
    }
}
