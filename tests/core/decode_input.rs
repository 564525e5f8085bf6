//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use textpatch::core::decode_input;

    #[test]
    fn utf8() {
        assert_eq!(decode_input("Olá".as_bytes()), "Olá");
    }

    #[test]
    fn utf8_bom_is_dropped() {
        assert_eq!(decode_input(b"\xEF\xBB\xBF<p>Hi</p>"), "<p>Hi</p>");
    }

    #[test]
    fn utf16_bom() {
        assert_eq!(decode_input(b"\xFF\xFEH\x00i\x00"), "Hi");
    }

    #[test]
    fn windows_1252_fallback() {
        assert_eq!(decode_input(b"Ol\xE1"), "Olá");
    }
}
