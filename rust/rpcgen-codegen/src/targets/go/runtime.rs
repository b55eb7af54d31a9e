//! Fixed support files: `rpc.go`, `rpc_client.go` and `rpc_server.go`.

use crate::Code;
use crate::render::header_line;

const RPC_GO: &str = r#"
import (
	"encoding/json"
	"fmt"
	"time"

	"github.com/fxamacker/cbor/v2"
)

const (
	ContentTypeJSON = "application/json"
	ContentTypeCBOR = "application/cbor"
)

// RpcError is the body of every failed call. Servers send it; clients
// return it from failed calls.
type RpcError struct {
	Code  int     `json:"code" cbor:"code"`
	Cause *string `json:"cause,omitempty" cbor:"cause,omitempty"`
	Msg   string  `json:"msg" cbor:"msg"`
	Kind  string  `json:"error" cbor:"error"`
}

func (e *RpcError) Error() string {
	if e.Cause != nil {
		return fmt.Sprintf("%s (%d): %s: %s", e.Kind, e.Code, e.Msg, *e.Cause)
	}
	return fmt.Sprintf("%s (%d): %s", e.Kind, e.Code, e.Msg)
}

func encodeBody(contentType string, v any) ([]byte, error) {
	if contentType == ContentTypeCBOR {
		return cbor.Marshal(v)
	}
	return json.Marshal(v)
}

func decodeBody(contentType string, data []byte, v any) error {
	if contentType == ContentTypeCBOR {
		return cbor.Unmarshal(data, v)
	}
	return json.Unmarshal(data, v)
}

// Timestamp travels as integer unix seconds.
type Timestamp struct {
	time.Time
}

func (t Timestamp) MarshalJSON() ([]byte, error) {
	return json.Marshal(t.Unix())
}

func (t *Timestamp) UnmarshalJSON(data []byte) error {
	var secs int64
	if err := json.Unmarshal(data, &secs); err != nil {
		return err
	}
	t.Time = time.Unix(secs, 0).UTC()
	return nil
}

func (t Timestamp) MarshalCBOR() ([]byte, error) {
	return cbor.Marshal(t.Unix())
}

func (t *Timestamp) UnmarshalCBOR(data []byte) error {
	var secs int64
	if err := cbor.Unmarshal(data, &secs); err != nil {
		return err
	}
	t.Time = time.Unix(secs, 0).UTC()
	return nil
}

func unmarshalTupleJSON(data []byte, items ...any) error {
	var raw []json.RawMessage
	if err := json.Unmarshal(data, &raw); err != nil {
		return err
	}
	if len(raw) != len(items) {
		return fmt.Errorf("expected %d tuple items, got %d", len(items), len(raw))
	}
	for i, item := range raw {
		if err := json.Unmarshal(item, items[i]); err != nil {
			return err
		}
	}
	return nil
}

func unmarshalTupleCBOR(data []byte, items ...any) error {
	var raw []cbor.RawMessage
	if err := cbor.Unmarshal(data, &raw); err != nil {
		return err
	}
	if len(raw) != len(items) {
		return fmt.Errorf("expected %d tuple items, got %d", len(items), len(raw))
	}
	for i, item := range raw {
		if err := cbor.Unmarshal(item, items[i]); err != nil {
			return err
		}
	}
	return nil
}
"#;

const RPC_CLIENT_GO: &str = r#"
import (
	"bytes"
	"context"
	"fmt"
	"io"
	"net/http"
	"net/url"
	"strconv"
	"strings"
)

// Client is shared by every generated service client.
type Client struct {
	BaseURL    string
	HTTPClient *http.Client
	Header     http.Header
}

func NewClient(baseURL string) *Client {
	return &Client{BaseURL: baseURL, HTTPClient: http.DefaultClient, Header: http.Header{}}
}

func (c *Client) do(ctx context.Context, method, path string, query url.Values, body any, requestType, responseType string) ([]byte, error) {
	target := strings.TrimSuffix(c.BaseURL, "/") + path
	if len(query) > 0 {
		target += "?" + query.Encode()
	}

	var reader io.Reader
	if body != nil {
		data, err := encodeBody(requestType, body)
		if err != nil {
			return nil, fmt.Errorf("encode %s: %w", path, err)
		}
		reader = bytes.NewReader(data)
	}

	req, err := http.NewRequestWithContext(ctx, method, target, reader)
	if err != nil {
		return nil, err
	}
	for key, values := range c.Header {
		for _, v := range values {
			req.Header.Add(key, v)
		}
	}
	req.Header.Set("Accept", responseType)
	if body != nil {
		req.Header.Set("Content-Type", requestType)
	}

	httpClient := c.HTTPClient
	if httpClient == nil {
		httpClient = http.DefaultClient
	}
	resp, err := httpClient.Do(req)
	if err != nil {
		return nil, err
	}
	defer resp.Body.Close()

	data, err := io.ReadAll(resp.Body)
	if err != nil {
		return nil, err
	}
	if resp.StatusCode >= 400 {
		var rpcErr RpcError
		if err := decodeBody(responseType, data, &rpcErr); err != nil || rpcErr.Kind == "" {
			return nil, &RpcError{Code: resp.StatusCode, Msg: strings.TrimSpace(string(data)), Kind: http.StatusText(resp.StatusCode)}
		}
		return nil, &rpcErr
	}
	return data, nil
}

type envelope[T any] struct {
	Data T `json:"data" cbor:"data"`
}

func call[T any](ctx context.Context, c *Client, method, path string, query url.Values, body any, requestType, responseType string) (T, error) {
	var out envelope[T]
	data, err := c.do(ctx, method, path, query, body, requestType, responseType)
	if err != nil {
		return out.Data, err
	}
	if err := decodeBody(responseType, data, &out); err != nil {
		return out.Data, fmt.Errorf("decode %s: %w", path, err)
	}
	return out.Data, nil
}

func callVoid(ctx context.Context, c *Client, method, path string, query url.Values, body any, requestType, responseType string) error {
	_, err := c.do(ctx, method, path, query, body, requestType, responseType)
	return err
}

func fmtBool(v bool) string { return strconv.FormatBool(v) }

func fmtInt[T ~int8 | ~int16 | ~int32 | ~int64](v T) string {
	return strconv.FormatInt(int64(v), 10)
}

func fmtUint[T ~uint8 | ~uint16 | ~uint32 | ~uint64](v T) string {
	return strconv.FormatUint(uint64(v), 10)
}

func fmtFloat32(v float32) string { return strconv.FormatFloat(float64(v), 'g', -1, 32) }

func fmtFloat64(v float64) string { return strconv.FormatFloat(v, 'g', -1, 64) }

func fmtTimestamp(v Timestamp) string { return strconv.FormatInt(v.Unix(), 10) }

func fmtString(v string) string { return v }
"#;

const RPC_SERVER_GO: &str = r#"
import (
	"errors"
	"fmt"
	"io"
	"net/http"
	"strconv"
	"strings"
	"time"
)

func queryOne[T any](req *http.Request, key string, conv func(string) (T, error)) (T, error) {
	var zero T
	values := req.URL.Query()[key]
	switch len(values) {
	case 0:
		return zero, fmt.Errorf("missing query parameter %q", key)
	case 1:
		v, err := conv(values[0])
		if err != nil {
			return zero, fmt.Errorf("query parameter %q: %w", key, err)
		}
		return v, nil
	default:
		return zero, fmt.Errorf("query parameter %q given more than once", key)
	}
}

func queryOpt[T any](req *http.Request, key string, conv func(string) (T, error)) (*T, error) {
	if _, ok := req.URL.Query()[key]; !ok {
		return nil, nil
	}
	v, err := queryOne(req, key, conv)
	if err != nil {
		return nil, err
	}
	return &v, nil
}

func queryList[T any](req *http.Request, key string, conv func(string) (T, error)) ([]T, error) {
	values := req.URL.Query()[key]
	out := make([]T, 0, len(values))
	for _, raw := range values {
		v, err := conv(raw)
		if err != nil {
			return nil, fmt.Errorf("query parameter %q: %w", key, err)
		}
		out = append(out, v)
	}
	return out, nil
}

// splitInteger accepts decimal or 0x hex with an optional leading minus.
// A leading 0 stays decimal.
func splitInteger(raw string) (string, int, error) {
	sign, body := "", raw
	if rest, ok := strings.CutPrefix(body, "-"); ok {
		sign, body = "-", rest
	}
	base := 10
	if len(body) > 2 && (body[:2] == "0x" || body[:2] == "0X") {
		base, body = 16, body[2:]
	}
	if body == "" || body[0] == '+' || body[0] == '-' {
		return "", 0, fmt.Errorf("invalid integer %q", raw)
	}
	return sign + body, base, nil
}

func parseSigned(raw string, bits int) (int64, error) {
	digits, base, err := splitInteger(raw)
	if err != nil {
		return 0, err
	}
	return strconv.ParseInt(digits, base, bits)
}

func parseUnsigned(raw string, bits int) (uint64, error) {
	digits, base, err := splitInteger(raw)
	if err != nil {
		return 0, err
	}
	return strconv.ParseUint(digits, base, bits)
}

func convBool(raw string) (bool, error) {
	switch raw {
	case "true":
		return true, nil
	case "false":
		return false, nil
	}
	return false, fmt.Errorf("invalid bool %q", raw)
}

func convFloat32(raw string) (float32, error) {
	v, err := strconv.ParseFloat(raw, 32)
	return float32(v), err
}

func convFloat64(raw string) (float64, error) {
	return strconv.ParseFloat(raw, 64)
}

func convTimestamp(raw string) (Timestamp, error) {
	v, err := parseSigned(raw, 64)
	if err != nil {
		return Timestamp{}, err
	}
	return Timestamp{time.Unix(v, 0).UTC()}, nil
}

func convString(raw string) (string, error) {
	return raw, nil
}

func writeBody(w http.ResponseWriter, status int, contentType string, v any) {
	data, err := encodeBody(contentType, v)
	if err != nil {
		http.Error(w, err.Error(), http.StatusInternalServerError)
		return
	}
	w.Header().Set("Content-Type", contentType)
	w.WriteHeader(status)
	_, _ = w.Write(data)
}

func writeData(w http.ResponseWriter, status int, contentType string, data any) {
	writeBody(w, status, contentType, struct {
		Data any `json:"data" cbor:"data"`
	}{Data: data})
}

// writeError keeps the fields of an *RpcError returned by the service.
func writeError(w http.ResponseWriter, status int, kind, contentType string, err error) {
	body := RpcError{Code: status, Msg: err.Error(), Kind: kind}
	var rpcErr *RpcError
	if errors.As(err, &rpcErr) {
		body = *rpcErr
		body.Code = status
		if body.Kind == "" {
			body.Kind = kind
		}
	}
	writeBody(w, status, contentType, body)
}

func badRequest(w http.ResponseWriter, contentType string, err error) {
	writeError(w, http.StatusBadRequest, "BadRequest", contentType, err)
}

func decodeRequest(req *http.Request, contentType string, v any) error {
	data, err := io.ReadAll(req.Body)
	if err != nil {
		return err
	}
	if len(data) == 0 {
		return nil
	}
	return decodeBody(contentType, data, v)
}
"#;

/// Tuple2..Tuple5 with array encodings in both codecs.
fn tuple_types() -> String {
    let mut out = String::new();
    for arity in 2..=5 {
        let params: Vec<String> = (0..arity).map(|i| format!("T{}", i + 1)).collect();
        let params = params.join(", ");
        let items: Vec<String> = (1..=arity).map(|i| format!("t.Item{i}")).collect();
        let items = items.join(", ");
        let ptrs: Vec<String> = (1..=arity).map(|i| format!("&t.Item{i}")).collect();
        let ptrs = ptrs.join(", ");
        let name = format!("Tuple{arity}");

        out.push_str(&format!("\n// {name} travels as a {arity}-element array.\n"));
        out.push_str(&format!("type {name}[{params} any] struct {{\n"));
        for i in 1..=arity {
            out.push_str(&format!("\tItem{i} T{i}\n"));
        }
        out.push_str("}\n");
        let recv = format!("{name}[{params}]");
        out.push_str(&format!(
            "\nfunc (t {recv}) MarshalJSON() ([]byte, error) {{\n\treturn json.Marshal([]any{{{items}}})\n}}\n"
        ));
        out.push_str(&format!(
            "\nfunc (t *{recv}) UnmarshalJSON(data []byte) error {{\n\treturn unmarshalTupleJSON(data, {ptrs})\n}}\n"
        ));
        out.push_str(&format!(
            "\nfunc (t {recv}) MarshalCBOR() ([]byte, error) {{\n\treturn cbor.Marshal([]any{{{items}}})\n}}\n"
        ));
        out.push_str(&format!(
            "\nfunc (t *{recv}) UnmarshalCBOR(data []byte) error {{\n\treturn unmarshalTupleCBOR(data, {ptrs})\n}}\n"
        ));
    }
    out
}

/// `convInt8` .. `convUint64`, range-checked by `strconv`.
fn integer_convs() -> String {
    let mut out = String::new();
    for bits in [8, 16, 32, 64] {
        out.push_str(&format!(
            "\nfunc convInt{bits}(raw string) (int{bits}, error) {{\n\tv, err := parseSigned(raw, {bits})\n\treturn int{bits}(v), err\n}}\n"
        ));
        out.push_str(&format!(
            "\nfunc convUint{bits}(raw string) (uint{bits}, error) {{\n\tv, err := parseUnsigned(raw, {bits})\n\treturn uint{bits}(v), err\n}}\n"
        ));
    }
    out
}

fn preamble(package: &str) -> String {
    format!("{}\n\npackage {package}\n", header_line("//", None))
}

pub fn rpc(package: &str) -> Code {
    Code {
        file_name: "rpc.go".to_string(),
        source: format!("{}{RPC_GO}{}", preamble(package), tuple_types()),
    }
}

pub fn client(package: &str) -> Code {
    Code {
        file_name: "rpc_client.go".to_string(),
        source: format!("{}{RPC_CLIENT_GO}", preamble(package)),
    }
}

pub fn server(package: &str) -> Code {
    Code {
        file_name: "rpc_server.go".to_string(),
        source: format!("{}{RPC_SERVER_GO}{}", preamble(package), integer_convs()),
    }
}
